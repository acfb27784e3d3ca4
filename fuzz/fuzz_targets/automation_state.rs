#![no_main]

use std::sync::Arc;

use harmoniq_automation::{AutoState, AutomationList, ConstantTempo, ParameterDescriptor, ParameterId};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let list = AutomationList::new(
        ParameterId::new(0, 0, 0),
        ParameterDescriptor::default(),
        Arc::new(ConstantTempo::default()),
    );
    if list.set_state_json(text).is_ok() {
        let _ = list.get_state().to_json();
    } else {
        assert!(list.is_empty());
        assert_eq!(list.automation_state(), AutoState::Off);
    }
});
