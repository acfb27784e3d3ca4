use harmoniq_automation::{
    current_sample_rate, samples_to_superclock, set_sample_rate_provider, superclock_to_samples,
    TimeError,
};

fn running_rate() -> u32 {
    96_000
}

fn other_rate() -> u32 {
    44_100
}

// Kept in its own test binary: the provider is process-wide and set once.
#[test]
fn provider_is_installed_once() {
    assert_eq!(current_sample_rate(), 0);
    set_sample_rate_provider(running_rate).unwrap();
    assert_eq!(current_sample_rate(), 96_000);

    assert_eq!(
        set_sample_rate_provider(other_rate),
        Err(TimeError::ProviderAlreadySet)
    );
    assert_eq!(current_sample_rate(), 96_000);

    let rate = i64::from(current_sample_rate());
    let ticks = samples_to_superclock(480, rate);
    assert_eq!(superclock_to_samples(ticks, rate), 480);
}
