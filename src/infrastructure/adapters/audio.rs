//! Audio Utilities - 基于 symphonia 的音频探测与 WAV 编码

use std::io::Cursor;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use thiserror::Error;

/// 音频探测错误
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("Unsupported audio: {0}")]
    Unsupported(String),

    #[error("Decoding error: {0}")]
    DecodingError(String),
}

/// 音频基本信息
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AudioInfo {
    /// 秒
    pub duration_secs: f64,
    pub sample_rate: u32,
    pub channels: u8,
}

/// 探测音频时长；容器未声明帧数时解码计数
pub fn probe(data: &[u8]) -> Result<AudioInfo, ProbeError> {
    let cursor = Cursor::new(data.to_vec());
    let mss = MediaSourceStream::new(Box::new(cursor), Default::default());

    let probed = symphonia::default::get_probe()
        .format(
            &Hint::new(),
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| ProbeError::Unsupported(format!("Probe failed: {}", e)))?;

    let mut format = probed.format;

    let track = format
        .default_track()
        .ok_or_else(|| ProbeError::Unsupported("No audio track found".to_string()))?;

    let sample_rate = track
        .codec_params
        .sample_rate
        .filter(|rate| *rate > 0)
        .ok_or_else(|| ProbeError::Unsupported("Unknown sample rate".to_string()))?;

    let channels = track
        .codec_params
        .channels
        .map(|c| c.count() as u8)
        .unwrap_or(1);

    if let Some(n_frames) = track.codec_params.n_frames {
        return Ok(AudioInfo {
            duration_secs: n_frames as f64 / sample_rate as f64,
            sample_rate,
            channels,
        });
    }

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| ProbeError::DecodingError(format!("Decoder creation failed: {}", e)))?;
    let track_id = track.id;
    let mut frames: u64 = 0;

    loop {
        let packet = match format.next_packet() {
            Ok(p) => p,
            Err(symphonia::core::errors::Error::IoError(e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => {
                return Err(ProbeError::DecodingError(format!("Packet read error: {}", e)));
            }
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => frames += decoded.frames() as u64,
            Err(e) => tracing::warn!(error = %e, "Decode error (skipping packet)"),
        }
    }

    Ok(AudioInfo {
        duration_secs: frames as f64 / sample_rate as f64,
        sample_rate,
        channels,
    })
}

/// 生成指定时长的 16 位单声道静音 WAV
pub fn silent_wav(duration_ms: u64, sample_rate: u32) -> Vec<u8> {
    let bits_per_sample: u16 = 16;
    let num_channels: u16 = 1;
    let num_samples = (sample_rate as u64 * duration_ms / 1000) as usize;
    let byte_rate = sample_rate * num_channels as u32 * (bits_per_sample / 8) as u32;
    let block_align = num_channels * (bits_per_sample / 8);

    let data_size = num_samples * (bits_per_sample as usize / 8);
    let file_size = 36 + data_size;

    let mut wav = Vec::with_capacity(44 + data_size);

    // RIFF header
    wav.extend_from_slice(b"RIFF");
    wav.extend_from_slice(&(file_size as u32).to_le_bytes());
    wav.extend_from_slice(b"WAVE");

    // fmt chunk
    wav.extend_from_slice(b"fmt ");
    wav.extend_from_slice(&16u32.to_le_bytes()); // chunk size
    wav.extend_from_slice(&1u16.to_le_bytes()); // PCM format
    wav.extend_from_slice(&num_channels.to_le_bytes());
    wav.extend_from_slice(&sample_rate.to_le_bytes());
    wav.extend_from_slice(&byte_rate.to_le_bytes());
    wav.extend_from_slice(&block_align.to_le_bytes());
    wav.extend_from_slice(&bits_per_sample.to_le_bytes());

    // data chunk
    wav.extend_from_slice(b"data");
    wav.extend_from_slice(&(data_size as u32).to_le_bytes());
    wav.resize(44 + data_size, 0);

    wav
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silent_wav_layout() {
        let wav = silent_wav(1000, 16000);
        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");
        assert_eq!(wav.len(), 44 + 32000);
    }

    #[test]
    fn test_probe_reports_duration() {
        let info = probe(&silent_wav(1500, 16000)).unwrap();
        assert_eq!(info.sample_rate, 16000);
        assert_eq!(info.channels, 1);
        assert!((info.duration_secs - 1.5).abs() < 0.01);
    }

    #[test]
    fn test_probe_rejects_garbage() {
        assert!(probe(b"definitely not audio").is_err());
    }
}
