const SAMPLE_SCALE: f32 = 1.0 / 32768.0;

/// Rescales signed 16-bit PCM into floats in roughly [-1.0, 1.0).
///
/// Gain is applied after normalization and is not clamped, so gain above 1.0
/// can push samples outside the nominal range. Clamping, if wanted, belongs
/// to the playback side.
pub fn convert_samples(samples: &[i16], gain: f32) -> Vec<f32> {
    samples
        .iter()
        .map(|&sample| f32::from(sample) * SAMPLE_SCALE * gain)
        .collect()
}

/// Same rescale for an interleaved stereo block, paired into `(left, right)`
/// frames. A trailing unpaired sample is dropped.
pub fn convert_stereo(samples: &[i16], gain: f32) -> Vec<(f32, f32)> {
    samples
        .chunks_exact(2)
        .map(|frame| {
            (
                f32::from(frame[0]) * SAMPLE_SCALE * gain,
                f32::from(frame[1]) * SAMPLE_SCALE * gain,
            )
        })
        .collect()
}

#[test]
fn test_convert_samples() {
    let converted = convert_samples(&[32767, -32768, 0], 1.0);
    assert!((converted[0] - 0.99997).abs() < 1e-4);
    assert_eq!(converted[1], -1.0);
    assert_eq!(converted[2], 0.0);
}

#[test]
fn test_zero_gain_silences_everything() {
    for sample in convert_samples(&[32767, -32768, 12345], 0.0) {
        assert_eq!(sample, 0.0);
    }
}

#[test]
fn test_gain_is_linear() {
    let converted = convert_samples(&[-32768, 16384], 2.0);
    assert_eq!(converted[0], -2.0);
    assert_eq!(converted[1], 1.0);
}

#[test]
fn test_empty_input() {
    assert!(convert_samples(&[], 1.0).is_empty());
    assert!(convert_stereo(&[], 1.0).is_empty());
}

#[test]
fn test_stereo_pairing() {
    let frames = convert_stereo(&[32767, -32768, 0, 16384, 99], 1.0);
    assert_eq!(frames.len(), 2);
    assert!((frames[0].0 - 0.99997).abs() < 1e-4);
    assert_eq!(frames[0].1, -1.0);
    assert_eq!(frames[1], (0.0, 0.5));
}
