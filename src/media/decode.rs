//! Format readers producing [`DecodedAudio`].
//!
//! WAV goes through hound, FLAC through claxon and MP3 through symphonia.
//! AIFF is small enough to parse by hand: a FORM container with a COMM chunk
//! describing the format and an SSND chunk holding big-endian PCM.

use super::DecodedAudio;
use std::error::Error;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{CODEC_TYPE_NULL, DecoderOptions};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

pub fn decode_file(path: &Path) -> Result<DecodedAudio, Box<dyn Error>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    let audio = match ext.as_str() {
        "wav" => decode_wav(path)?,
        "flac" => decode_flac(path)?,
        "aif" | "aiff" => decode_aiff(path)?,
        "mp3" => decode_mp3(path)?,
        _ => return Err(format!("Unsupported audio format: {ext}").into()),
    };

    log::info!(
        "Decoded {}: {} Hz, {} channels, {} frames",
        path.display(),
        audio.sample_rate(),
        audio.channels(),
        audio.frames()
    );

    Ok(audio)
}

fn decode_wav(path: &Path) -> Result<DecodedAudio, Box<dyn Error>> {
    let mut reader = hound::WavReader::new(BufReader::new(File::open(path)?))?;
    let spec = reader.spec();

    let samples = match spec.sample_format {
        hound::SampleFormat::Float => reader.samples::<f32>().collect::<Result<Vec<_>, _>>()?,
        hound::SampleFormat::Int => {
            if spec.bits_per_sample == 0 || spec.bits_per_sample > 32 {
                return Err(format!("Unsupported bit depth: {}", spec.bits_per_sample).into());
            }
            let scale = int_scale(spec.bits_per_sample as u32);
            reader
                .samples::<i32>()
                .map(|s| s.map(|s| s as f32 / scale))
                .collect::<Result<Vec<_>, _>>()?
        }
    };

    Ok(DecodedAudio::new(samples, spec.channels, spec.sample_rate))
}

fn decode_flac(path: &Path) -> Result<DecodedAudio, Box<dyn Error>> {
    let mut reader = claxon::FlacReader::open(path)?;
    let info = reader.streaminfo();
    let scale = int_scale(info.bits_per_sample);

    let mut samples = Vec::with_capacity(
        info.samples.unwrap_or(0) as usize * info.channels as usize,
    );
    for sample in reader.samples() {
        samples.push(sample? as f32 / scale);
    }

    Ok(DecodedAudio::new(
        samples,
        info.channels as u16,
        info.sample_rate,
    ))
}

fn decode_mp3(path: &Path) -> Result<DecodedAudio, Box<dyn Error>> {
    let file = File::open(path)?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    hint.with_extension("mp3");

    let probed = symphonia::default::get_probe().format(
        &hint,
        mss,
        &FormatOptions::default(),
        &MetadataOptions::default(),
    )?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or("No audio track found")?;
    let track_id = track.id;
    let codec_params = track.codec_params.clone();

    let mut decoder =
        symphonia::default::get_codecs().make(&codec_params, &DecoderOptions::default())?;

    let mut sample_rate = codec_params.sample_rate;
    let mut channels = codec_params.channels.map(|c| c.count() as u16);
    let mut samples = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => return Err(e.into()),
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                let spec = *decoded.spec();
                sample_rate.get_or_insert(spec.rate);
                channels.get_or_insert(spec.channels.count() as u16);

                let mut buffer = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
                buffer.copy_interleaved_ref(decoded);
                samples.extend_from_slice(buffer.samples());
            }
            Err(SymphoniaError::DecodeError(e)) => {
                log::warn!("Skipping corrupt MP3 frame in {}: {e}", path.display());
            }
            Err(e) => return Err(e.into()),
        }
    }

    let sample_rate = sample_rate.ok_or("Sample rate not found")?;
    let channels = channels.ok_or("Channel count not found")?;

    Ok(DecodedAudio::new(samples, channels, sample_rate))
}

#[derive(Debug)]
struct AiffFormat {
    channels: u16,
    frames: u32,
    bits_per_sample: u16,
    sample_rate: u32,
    little_endian: bool,
}

fn decode_aiff(path: &Path) -> Result<DecodedAudio, Box<dyn Error>> {
    let bytes = fs::read(path)?;
    parse_aiff(&bytes)
}

fn parse_aiff(bytes: &[u8]) -> Result<DecodedAudio, Box<dyn Error>> {
    if bytes.len() < 12 || &bytes[0..4] != b"FORM" {
        return Err("Not a valid AIFF file".into());
    }
    let is_aifc = match &bytes[8..12] {
        b"AIFF" => false,
        b"AIFC" => true,
        _ => return Err("Not a valid AIFF file".into()),
    };

    let mut format: Option<AiffFormat> = None;
    let mut sound: Option<&[u8]> = None;
    let mut offset = 12;

    while offset + 8 <= bytes.len() {
        let chunk_id = &bytes[offset..offset + 4];
        let size = read_u32_be(&bytes[offset + 4..offset + 8]) as usize;
        let body_start = offset + 8;
        let body_end = body_start.saturating_add(size).min(bytes.len());
        let body = &bytes[body_start..body_end];

        match chunk_id {
            b"COMM" => format = Some(parse_comm(body, is_aifc)?),
            b"SSND" => {
                if body.len() < 8 {
                    return Err("Truncated SSND chunk".into());
                }
                let data_offset = read_u32_be(&body[0..4]) as usize;
                sound = Some(body.get(8 + data_offset..).unwrap_or(&[]));
            }
            _ => {}
        }

        // Chunks are padded to an even length
        offset = body_start.saturating_add(size + (size & 1));
    }

    let format = format.ok_or("AIFF file has no COMM chunk")?;
    let sound = sound.ok_or("AIFF file has no SSND chunk")?;

    if format.bits_per_sample == 0 || format.bits_per_sample > 32 {
        return Err(format!("Unsupported bit depth: {}", format.bits_per_sample).into());
    }

    // Samples are left-justified in whole bytes
    let width = format.bits_per_sample.div_ceil(8) as usize;
    let scale = int_scale(width as u32 * 8);
    let wanted = format.frames as usize * format.channels as usize;

    let samples = sound
        .chunks_exact(width)
        .take(wanted)
        .map(|raw| read_signed(raw, format.little_endian) as f32 / scale)
        .collect::<Vec<_>>();

    log::debug!("AIFF format: {format:?}");

    Ok(DecodedAudio::new(
        samples,
        format.channels,
        format.sample_rate,
    ))
}

fn parse_comm(body: &[u8], is_aifc: bool) -> Result<AiffFormat, Box<dyn Error>> {
    if body.len() < 18 {
        return Err("Truncated COMM chunk".into());
    }

    let channels = u16::from_be_bytes([body[0], body[1]]);
    let frames = read_u32_be(&body[2..6]);
    let bits_per_sample = u16::from_be_bytes([body[6], body[7]]);
    let mut rate = [0u8; 10];
    rate.copy_from_slice(&body[8..18]);
    let sample_rate = extended_to_f64(&rate).round() as u32;

    let little_endian = if is_aifc {
        match body.get(18..22) {
            Some(b"NONE") | None => false,
            Some(b"sowt") => true,
            Some(other) => {
                return Err(format!(
                    "Unsupported AIFC compression: {}",
                    String::from_utf8_lossy(other)
                )
                .into());
            }
        }
    } else {
        false
    };

    Ok(AiffFormat {
        channels,
        frames,
        bits_per_sample,
        sample_rate,
        little_endian,
    })
}

/// IEEE 754 80-bit extended precision, as used for the AIFF sample rate.
fn extended_to_f64(bytes: &[u8; 10]) -> f64 {
    let negative = bytes[0] & 0x80 != 0;
    let exponent = (((bytes[0] & 0x7F) as i32) << 8) | bytes[1] as i32;
    let mut mantissa_bytes = [0u8; 8];
    mantissa_bytes.copy_from_slice(&bytes[2..10]);
    let mantissa = u64::from_be_bytes(mantissa_bytes);

    if exponent == 0 && mantissa == 0 {
        return 0.0;
    }

    let value = mantissa as f64 * 2f64.powi(exponent - 16383 - 63);
    if negative { -value } else { value }
}

fn read_u32_be(bytes: &[u8]) -> u32 {
    u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

fn read_signed(raw: &[u8], little_endian: bool) -> i32 {
    let mut value: i32 = 0;
    if little_endian {
        for &b in raw.iter().rev() {
            value = (value << 8) | b as i32;
        }
    } else {
        for &b in raw {
            value = (value << 8) | b as i32;
        }
    }
    // Sign-extend from the sample width
    let shift = 32 - raw.len() as u32 * 8;
    if shift > 0 {
        (value << shift) >> shift
    } else {
        value
    }
}

fn int_scale(bits: u32) -> f32 {
    (1u64 << (bits.clamp(1, 32) - 1)) as f32
}
