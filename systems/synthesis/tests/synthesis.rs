use ar_summon_core::SoundId;
use ar_summon_system_synthesis::{
    frame_count, synthesize, synthesize_named, SoundBank, SynthesisError,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

const SAMPLE_RATES: [u32; 4] = [8_000, 22_050, 44_100, 48_000];

#[test]
fn buffer_length_matches_duration_times_rate() {
    let mut rng = ChaCha8Rng::seed_from_u64(0x5151);
    for sample_rate in SAMPLE_RATES {
        for sound in SoundId::ALL {
            let buffer = synthesize(sound, sample_rate, &mut rng).expect("synthesis");
            let expected = (u64::from(sample_rate) * sound.duration_millis() / 1_000) as usize;
            assert_eq!(buffer.frames(), expected, "{sound:?} at {sample_rate} Hz");
            assert_eq!(frame_count(sound, sample_rate), expected);
            assert_eq!(buffer.channel_count(), sound.channel_count());
            for channel in 0..buffer.channel_count() {
                assert_eq!(buffer.channel(channel).map(<[f32]>::len), Some(expected));
            }
        }
    }
}

#[test]
fn every_sample_stays_within_its_declared_bound() {
    let mut rng = ChaCha8Rng::seed_from_u64(0xa11ce);
    for sample_rate in SAMPLE_RATES {
        for sound in SoundId::ALL {
            let buffer = synthesize(sound, sample_rate, &mut rng).expect("synthesis");
            let peak = buffer.peak();
            assert!(peak <= 1.0, "{sound:?} clipped range violated");
            assert!(
                peak <= sound.peak_bound() + 1e-4,
                "{sound:?} peak {peak} exceeds {}",
                sound.peak_bound()
            );
            assert!(peak > 0.0, "{sound:?} is silent");
        }
    }
}

#[test]
fn seeded_synthesis_is_reproducible() {
    let first = synthesize(
        SoundId::EffectTrigger,
        44_100,
        &mut ChaCha8Rng::seed_from_u64(99),
    )
    .expect("synthesis");
    let second = synthesize(
        SoundId::EffectTrigger,
        44_100,
        &mut ChaCha8Rng::seed_from_u64(99),
    )
    .expect("synthesis");
    assert_eq!(first, second);
}

#[test]
fn unknown_names_fail_synthesis() {
    let mut rng = ChaCha8Rng::seed_from_u64(1);
    assert_eq!(
        synthesize_named("dragon", 44_100, &mut rng),
        Err(SynthesisError::UnknownSound {
            name: "dragon".to_owned()
        })
    );
    let buffer = synthesize_named("ui", 44_100, &mut rng).expect("known sound");
    assert_eq!(buffer.id(), SoundId::UiConfirm);
}

#[test]
fn bank_holds_every_sound_once() {
    let mut rng = ChaCha8Rng::seed_from_u64(2);
    let bank = SoundBank::synthesize_all(16_000, &mut rng).expect("bank");
    assert_eq!(bank.len(), SoundId::ALL.len());
    assert_eq!(bank.sample_rate(), 16_000);
    for sound in SoundId::ALL {
        let by_id = bank.get(sound).expect("buffer");
        let by_name = bank.get_by_name(sound.name()).expect("buffer");
        assert!(std::sync::Arc::ptr_eq(&by_id, &by_name));
        assert_eq!(by_id.duration().as_millis() as u64, sound.duration_millis());
    }
    assert!(bank.get_by_name("unknown").is_none());
    assert_eq!(
        SoundBank::synthesize_all(0, &mut rng).map(|bank| bank.len()),
        Err(SynthesisError::ZeroSampleRate)
    );
}
