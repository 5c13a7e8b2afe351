//! Integration Tests
//!
//! End-to-end sign/verify properties of the segment pipeline.

use melseal::crypto::MIN_KEY_BITS;
use melseal::{
    KeyPair, PipelineConfig, SegmentPipeline, SignatureManifest, Signer, Verifier, VerifyOutcome,
    Waveform,
};
use pretty_assertions::assert_eq;
use test_case::test_case;

/// Helper to create a test signal with a different tone per second
fn create_test_waveform(duration_secs: f64, sample_rate: u32) -> Waveform {
    let num_samples = (duration_secs * sample_rate as f64) as usize;
    let samples = (0..num_samples)
        .map(|i| {
            let t = i as f64 / sample_rate as f64;
            let frequency = 220.0 * (1.0 + t.floor());
            (0.5 * (2.0 * std::f64::consts::PI * frequency * t).sin()) as f32
        })
        .collect();
    Waveform::new(samples, sample_rate).unwrap()
}

fn session_keys() -> KeyPair {
    KeyPair::generate_with_bits(MIN_KEY_BITS).unwrap()
}

// === Round Trip ===

#[test]
fn test_three_seconds_at_16k_gives_three_valid_segments() {
    let keys = KeyPair::generate().unwrap();
    let pipeline = SegmentPipeline::new(PipelineConfig::default()).unwrap();
    let waveform = create_test_waveform(3.0, 16000);

    let signed = pipeline
        .sign_and_reconstruct(&Signer::new(&keys), &waveform)
        .unwrap();
    let report = pipeline
        .verify_segments(&Verifier::new(&keys), &signed.waveform, &signed.signatures)
        .unwrap();

    assert_eq!(signed.signatures.len(), 3);
    assert_eq!(signed.signatures[0].len(), 256);
    assert_eq!(report.results(), vec![true, true, true]);
}

#[test_case(0.2, 8000 ; "shorter than a segment")]
#[test_case(2.0, 8000 ; "exact multiple")]
#[test_case(2.7, 11025 ; "short tail")]
#[test_case(1.01, 22050 ; "tiny tail")]
fn test_round_trip_all_true(duration_secs: f64, sample_rate: u32) {
    let keys = session_keys();
    let pipeline = SegmentPipeline::new(PipelineConfig::default()).unwrap();
    let waveform = create_test_waveform(duration_secs, sample_rate);

    let signed = pipeline
        .sign_and_reconstruct(&Signer::new(&keys), &waveform)
        .unwrap();
    let report = pipeline
        .verify_segments(&Verifier::new(&keys), &signed.waveform, &signed.signatures)
        .unwrap();

    let expected = waveform.len().div_ceil(sample_rate as usize);
    assert_eq!(signed.signatures.len(), expected);
    assert_eq!(report.len(), expected);
    assert!(report.all_valid(), "failed: {:?}", report.failed_segments());
}

#[test]
fn test_custom_segment_duration_round_trip() {
    let keys = session_keys();
    let config = PipelineConfig::with_segment_duration(0.25);
    let pipeline = SegmentPipeline::new(config).unwrap();
    let waveform = create_test_waveform(1.1, 8000);

    let signed = pipeline
        .sign_and_reconstruct(&Signer::new(&keys), &waveform)
        .unwrap();
    let report = pipeline
        .verify_segments(&Verifier::new(&keys), &waveform, &signed.signatures)
        .unwrap();

    assert_eq!(signed.segment_length, 2000);
    assert_eq!(report.results(), vec![true; 5]);
}

// === Reconstruction ===

#[test]
fn test_reconstruction_is_sample_exact() {
    let keys = session_keys();
    let pipeline = SegmentPipeline::new(PipelineConfig::default()).unwrap();
    let waveform = create_test_waveform(2.4, 16000);

    let signed = pipeline
        .sign_and_reconstruct(&Signer::new(&keys), &waveform)
        .unwrap();

    assert!(signed.waveform.is_identical_to(&waveform));
}

// === Tamper Sensitivity ===

#[test_case(0, 0 ; "first sample")]
#[test_case(1, 20000 ; "middle segment")]
#[test_case(3, 48000 ; "first sample of tail")]
fn test_single_sample_tamper_flags_only_its_segment(segment: usize, index: usize) {
    let keys = session_keys();
    let pipeline = SegmentPipeline::new(PipelineConfig::default()).unwrap();
    let waveform = create_test_waveform(3.5, 16000);
    let signed = pipeline
        .sign_and_reconstruct(&Signer::new(&keys), &waveform)
        .unwrap();

    let mut tampered = waveform.clone();
    tampered.samples_mut()[index] += 0.25;

    let report = pipeline
        .verify_segments(&Verifier::new(&keys), &tampered, &signed.signatures)
        .unwrap();

    let mut expected = vec![true; 4];
    expected[segment] = false;
    assert_eq!(report.results(), expected);
    assert_eq!(report.outcomes()[segment], VerifyOutcome::Mismatch);
}

// === Key Mismatch ===

#[test]
fn test_wrong_public_key_fails_every_segment() {
    let pipeline = SegmentPipeline::new(PipelineConfig::default()).unwrap();
    let waveform = create_test_waveform(3.0, 8000);
    let signed = pipeline
        .sign_and_reconstruct(&Signer::new(&session_keys()), &waveform)
        .unwrap();

    let report = pipeline
        .verify_segments(&Verifier::new(&session_keys()), &waveform, &signed.signatures)
        .unwrap();

    assert_eq!(report.results(), vec![false, false, false]);
}

// === Configuration Errors ===

#[test]
fn test_mismatched_segment_duration_is_a_configuration_error() {
    let keys = session_keys();
    let waveform = create_test_waveform(2.0, 8000);
    let signed = SegmentPipeline::new(PipelineConfig::default())
        .unwrap()
        .sign_and_reconstruct(&Signer::new(&keys), &waveform)
        .unwrap();

    let err = SegmentPipeline::new(PipelineConfig::with_segment_duration(0.5))
        .unwrap()
        .verify_segments(&Verifier::new(&keys), &waveform, &signed.signatures)
        .unwrap_err();

    assert_eq!(err.error_code(), "SIGNATURE_COUNT_MISMATCH");
    assert!(err.is_configuration_error());
}

#[test]
fn test_empty_waveform_verifies_to_empty_report() {
    let keys = session_keys();
    let pipeline = SegmentPipeline::new(PipelineConfig::default()).unwrap();
    let waveform = Waveform::empty(16000).unwrap();

    let signed = pipeline
        .sign_and_reconstruct(&Signer::new(&keys), &waveform)
        .unwrap();
    let report = pipeline
        .verify_segments(&Verifier::new(&keys), &waveform, &signed.signatures)
        .unwrap();

    assert!(report.is_empty());
    assert!(report.all_valid());
}

// === Manifest ===

#[test]
fn test_manifest_json_drives_verification() {
    let keys = session_keys();
    let signer = Signer::new(&keys);
    let config = PipelineConfig::with_segment_duration(1.0 / 3.0 + 7.0 * f64::EPSILON);
    let pipeline = SegmentPipeline::new(config.clone()).unwrap();
    let waveform = create_test_waveform(1.2, 8000);

    let signed = pipeline.sign_and_reconstruct(&signer, &waveform).unwrap();
    let json = SignatureManifest::new(&signed, &config, signer.fingerprint())
        .to_json()
        .unwrap();
    let manifest = SignatureManifest::from_json(&json).unwrap();

    let report = pipeline
        .verify_manifest(&Verifier::new(&keys), &waveform, &manifest)
        .unwrap();
    assert_eq!(report.len(), 4);
    assert!(report.all_valid());
}

#[test]
fn test_manifest_rejects_other_segment_length_with_same_count() {
    let keys = session_keys();
    let signer = Signer::new(&keys);
    let waveform = create_test_waveform(1.9, 8000);
    let signing = SegmentPipeline::new(PipelineConfig::default()).unwrap();
    let signed = signing.sign_and_reconstruct(&signer, &waveform).unwrap();
    let manifest = SignatureManifest::new(&signed, signing.config(), signer.fingerprint());

    let err = SegmentPipeline::new(PipelineConfig::with_segment_duration(0.95))
        .unwrap()
        .verify_manifest(&Verifier::new(&keys), &waveform, &manifest)
        .unwrap_err();

    assert_eq!(err.error_code(), "MANIFEST_MISMATCH");
    assert!(err.is_configuration_error());
}
