fn main() {
    // Build-time configuration overrides are read with `option_env!`, so a
    // changed value must trigger a rebuild.
    for key in irrigator_override_keys() {
        println!("cargo:rerun-if-env-changed={key}");
    }
    println!("cargo:rerun-if-env-changed=IRRIGATOR_CONFIG_JSON");

    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}

fn irrigator_override_keys() -> &'static [&'static str] {
    &[
        "IRRIGATOR_WIFI_SSID",
        "IRRIGATOR_WIFI_PASSWORD",
        "IRRIGATOR_DECISION_URL",
        "IRRIGATOR_DECISION_TIMEOUT_MS",
        "IRRIGATOR_MOISTURE_GPIO",
        "IRRIGATOR_LIGHT_GPIO",
        "IRRIGATOR_PUMP_GPIO",
        "IRRIGATOR_BUTTON_GPIO",
        "IRRIGATOR_PUMP_ACTIVE_LOW",
        "IRRIGATOR_SAMPLE_RATE_HZ",
        "IRRIGATOR_MIN_SPREAD",
        "IRRIGATOR_PUMP_PERIOD_MS",
        "IRRIGATOR_PUMP_DUTY",
        "IRRIGATOR_PUMP_DURATION_S",
        "IRRIGATOR_OFFLINE_BACKOFF_MS",
        "IRRIGATOR_RECHECK_MS",
        "IRRIGATOR_IDLE_MS",
        "IRRIGATOR_FAILURE_BACKOFF_MS",
    ]
}
