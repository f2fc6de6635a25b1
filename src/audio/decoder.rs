use crate::types::AudioData;
use anyhow::{Context, Result};
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, warn};

/// Decode an audio file to raw PCM samples (mono, f32)
///
/// Any container/codec enabled in symphonia is accepted; the file extension
/// is only used as a probing hint. Multi-channel audio is averaged to mono.
pub fn decode_audio<P: AsRef<Path>>(path: P) -> Result<AudioData> {
    let path = path.as_ref();

    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open audio file: {}", path.display()))?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(extension) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(extension);
    }

    let probe_result = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .context("Failed to probe audio format")?;
    let mut format = probe_result.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .context("No audio tracks found in file")?;
    let track_id = track.id;
    let sample_rate = track
        .codec_params
        .sample_rate
        .context("Sample rate not specified in audio file")?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .context("Failed to create decoder")?;

    let mut samples = Vec::new();
    let mut skipped_packets = 0usize;
    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(err))
                if err.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(err) => return Err(err).context("Failed to read packet"),
        };
        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(reason)) => {
                // Corrupt frames are dropped; the rest of the recording is still usable.
                warn!(%reason, "skipping undecodable audio packet");
                skipped_packets += 1;
                continue;
            }
            Err(err) => return Err(err).context("Failed to decode audio packet"),
        };

        let channels = decoded.spec().channels.count().max(1);
        let mut interleaved = SampleBuffer::<f32>::new(decoded.capacity() as u64, *decoded.spec());
        interleaved.copy_interleaved_ref(decoded);
        samples.extend(downmix_interleaved(interleaved.samples(), channels));
    }

    debug!(
        path = %path.display(),
        sample_rate,
        samples = samples.len(),
        skipped_packets,
        "decoded audio"
    );
    Ok(AudioData {
        samples,
        sample_rate,
    })
}

/// Average interleaved frames down to a single channel
pub fn downmix_interleaved(interleaved: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return interleaved.to_vec();
    }
    interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}
