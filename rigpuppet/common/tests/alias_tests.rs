use api::{CanonicalChannel, Diagnostic, DiagnosticSink, RigMorphCatalog};
use common::AliasResolver;
use std::sync::Mutex;

fn catalog(names: &[&str]) -> RigMorphCatalog {
    RigMorphCatalog::from_names(names.iter().copied()).unwrap()
}

#[derive(Default)]
struct Recorder(Mutex<Vec<Diagnostic>>);

impl DiagnosticSink for Recorder {
    fn report(&self, event: &Diagnostic) {
        self.0.lock().unwrap().push(event.clone());
    }
}

#[test]
fn test_exact_name_beats_aliases() {
    let binding = AliasResolver::new().resolve(&catalog(&["JawOpen", "jawOpen"]));
    assert_eq!(binding.slot(CanonicalChannel::JawOpen), Some(1));
}

#[test]
fn test_alias_beats_case_insensitive_match() {
    let binding = AliasResolver::new().resolve(&catalog(&["JAWOPEN", "jaw_open"]));
    assert_eq!(binding.slot(CanonicalChannel::JawOpen), Some(1));
}

#[test]
fn test_generated_variants_beat_curated_names() {
    let binding = AliasResolver::new().resolve(&catalog(&["MouthOpen", "Jaw_Open"]));
    assert_eq!(binding.slot(CanonicalChannel::JawOpen), Some(1));
}

#[test]
fn test_case_insensitive_match() {
    let binding = AliasResolver::new().resolve(&catalog(&["EYEBLINKLEFT", "Mouth_Smile_L"]));
    assert_eq!(binding.slot(CanonicalChannel::EyeBlinkLeft), Some(0));
    assert_eq!(binding.slot(CanonicalChannel::MouthSmileLeft), Some(1));
}

#[test]
fn test_common_rig_conventions() {
    let names = [
        "eyeBlink_L",
        "eyeBlink_R",
        "EyeLookUpLeft",
        "eye_look_up_right",
        "Blink_L",
        "browInnerUp",
    ];
    let binding = AliasResolver::new().resolve(&catalog(&names));
    assert_eq!(binding.slot(CanonicalChannel::EyeBlinkLeft), Some(0));
    assert_eq!(binding.slot(CanonicalChannel::EyeBlinkRight), Some(1));
    assert_eq!(binding.slot(CanonicalChannel::EyeLookUpLeft), Some(2));
    assert_eq!(binding.slot(CanonicalChannel::EyeLookUpRight), Some(3));
    assert_eq!(binding.slot(CanonicalChannel::BrowInnerUp), Some(5));
    assert!(!binding.is_bound(CanonicalChannel::TongueOut));
}

#[test]
fn test_numeric_catalog_binds_channel_to_its_index() {
    let names: Vec<String> = (0..CanonicalChannel::COUNT).map(|i| i.to_string()).collect();
    let binding = AliasResolver::new().resolve(&RigMorphCatalog::from_names(names).unwrap());
    assert!(binding.used_numeric_fallback());
    assert_eq!(binding.len(), CanonicalChannel::COUNT);
    for channel in CanonicalChannel::ALL {
        assert_eq!(binding.slot(channel), Some(channel.index()));
    }
    assert_eq!(binding.slot(CanonicalChannel::EyeBlinkLeft), Some(0));
    assert_eq!(binding.slot(CanonicalChannel::TongueOut), Some(51));
}

#[test]
fn test_numeric_fallback_binds_by_index() {
    let mut names: Vec<String> = (0..CanonicalChannel::COUNT).map(|i| i.to_string()).collect();
    // A stray named morph must not pull any channel away from its index.
    names.insert(0, "jawOpen".to_string());
    let catalog = RigMorphCatalog::from_names(names).unwrap();

    let binding = AliasResolver::new().resolve(&catalog);
    assert!(binding.used_numeric_fallback());
    assert_eq!(binding.len(), CanonicalChannel::COUNT);
    for channel in CanonicalChannel::ALL {
        assert_eq!(binding.slot(channel), Some(channel.index() + 1));
    }
}

#[test]
fn test_short_numeric_catalog_is_not_a_layout() {
    let names: Vec<String> = (0..10).map(|i| i.to_string()).collect();
    let binding = AliasResolver::new().resolve(&RigMorphCatalog::from_names(names).unwrap());
    assert!(!binding.used_numeric_fallback());
    assert!(binding.is_empty());
}

#[test]
fn test_fuzzy_fallback_for_blink_and_jaw() {
    let binding = AliasResolver::new().resolve(&catalog(&[
        "Eyes_Closed_L",
        "Eyes_Closed_R",
        "Face.mouth_opened",
    ]));
    assert_eq!(binding.slot(CanonicalChannel::EyeBlinkLeft), Some(0));
    assert_eq!(binding.slot(CanonicalChannel::EyeBlinkRight), Some(1));
    assert_eq!(binding.slot(CanonicalChannel::JawOpen), Some(2));
}

#[test]
fn test_fuzzy_fallback_rejects_the_opposite_side() {
    let binding = AliasResolver::new().resolve(&catalog(&["blink_right_eye"]));
    assert!(!binding.is_bound(CanonicalChannel::EyeBlinkLeft));
    assert_eq!(binding.slot(CanonicalChannel::EyeBlinkRight), Some(0));
}

#[test]
fn test_fuzzy_fallback_ignores_lid_in_names() {
    let binding = AliasResolver::new().resolve(&catalog(&["Eye_Lid_Closed_R"]));
    assert!(!binding.is_bound(CanonicalChannel::EyeBlinkLeft));
    assert_eq!(binding.slot(CanonicalChannel::EyeBlinkRight), Some(0));

    let binding =
        AliasResolver::new().resolve(&catalog(&["Eye_Lid_Closed_L", "Eye_Lid_Closed_R"]));
    assert_eq!(binding.slot(CanonicalChannel::EyeBlinkLeft), Some(0));
    assert_eq!(binding.slot(CanonicalChannel::EyeBlinkRight), Some(1));
}

#[test]
fn test_fuzzy_fallback_skips_claimed_slots() {
    let binding = AliasResolver::new().resolve(&catalog(&["Blink_MouthOpen_L"]));
    assert_eq!(binding.slot(CanonicalChannel::EyeBlinkLeft), Some(0));
    assert!(!binding.is_bound(CanonicalChannel::JawOpen));
}

#[test]
fn test_empty_catalog_binds_nothing() {
    let recorder = Recorder::default();
    let binding = AliasResolver::new().resolve_with_sink(&RigMorphCatalog::default(), &recorder);
    assert!(binding.is_empty());

    let events = recorder.0.lock().unwrap();
    match &events[..] {
        [Diagnostic::ChannelCoverage {
            bound,
            total,
            numeric_fallback,
            unmatched,
        }] => {
            assert_eq!(*bound, 0);
            assert_eq!(*total, CanonicalChannel::COUNT);
            assert!(!numeric_fallback);
            assert_eq!(unmatched.len(), CanonicalChannel::COUNT);
        }
        other => panic!("unexpected diagnostics: {:?}", other),
    }
}
