//! ffprobe JSON output parsing for duration probing.
//!
//! The engine runs ffprobe with `-print_format json`; this module turns the
//! JSON into a [`MediaInfo`] and rejects output without a usable duration.

use serde::Deserialize;

use crate::engine::EngineError;

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
    size: Option<String>,
    #[serde(default)]
    format_name: Option<String>,
    #[serde(default)]
    nb_streams: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: Option<String>,
    #[serde(default)]
    codec_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: Option<FfprobeFormat>,
    streams: Option<Vec<FfprobeStream>>,
}

/// Probed source metadata. `duration` is always finite and positive.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaInfo {
    pub duration: f64,
    pub size: u64,
    pub format_name: Option<String>,
    pub video_codec: Option<String>,
    pub nb_streams: Option<u32>,
}

/// Parse ffprobe JSON output. Fails when the duration is missing,
/// unparseable, or non-positive.
pub fn parse_probe_json(json: &str) -> Result<MediaInfo, EngineError> {
    let output: FfprobeOutput = serde_json::from_str(json)
        .map_err(|e| EngineError::Probe(format!("failed to parse ffprobe JSON: {}", e)))?;

    let format = output.format.as_ref();
    let duration = format
        .and_then(|f| f.duration.as_ref())
        .and_then(|s| s.parse::<f64>().ok())
        .ok_or_else(|| EngineError::Probe("no duration in ffprobe output".to_string()))?;
    if !duration.is_finite() || duration <= 0.0 {
        return Err(EngineError::Probe(format!(
            "non-positive duration: {}",
            duration
        )));
    }

    let size = format
        .and_then(|f| f.size.as_ref())
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(0);
    let format_name = format.and_then(|f| f.format_name.clone());
    let nb_streams = format.and_then(|f| f.nb_streams);
    let video_codec = output
        .streams
        .as_ref()
        .and_then(|streams| {
            streams
                .iter()
                .find(|s| s.codec_type.as_deref() == Some("video"))
        })
        .and_then(|s| s.codec_name.clone());

    Ok(MediaInfo {
        duration,
        size,
        format_name,
        video_codec,
        nb_streams,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_duration_and_metadata() {
        let json = r#"{
            "format": {
                "duration": "95.42",
                "size": "12345678",
                "format_name": "mov,mp4,m4a,3gp,3g2,mj2",
                "nb_streams": 2
            },
            "streams": [
                {"codec_type": "audio", "codec_name": "aac"},
                {"codec_type": "video", "codec_name": "h264"}
            ]
        }"#;
        let info = parse_probe_json(json).unwrap();
        assert_eq!(info.duration, 95.42);
        assert_eq!(info.size, 12_345_678);
        assert_eq!(info.format_name.as_deref(), Some("mov,mp4,m4a,3gp,3g2,mj2"));
        assert_eq!(info.video_codec.as_deref(), Some("h264"));
        assert_eq!(info.nb_streams, Some(2));
    }

    #[test]
    fn missing_duration_is_an_error() {
        let json = r#"{"format": {"size": "1000"}, "streams": []}"#;
        let err = parse_probe_json(json).unwrap_err();
        assert!(matches!(err, EngineError::Probe(_)));
    }

    #[test]
    fn zero_duration_is_an_error() {
        let json = r#"{"format": {"duration": "0.0"}, "streams": []}"#;
        let err = parse_probe_json(json).unwrap_err();
        assert!(err.to_string().contains("non-positive"));
    }

    #[test]
    fn unparseable_duration_is_an_error() {
        let json = r#"{"format": {"duration": "N/A"}, "streams": []}"#;
        assert!(parse_probe_json(json).is_err());
    }

    #[test]
    fn invalid_json_is_an_error() {
        assert!(parse_probe_json("not json").is_err());
    }

    #[test]
    fn missing_video_stream_still_parses() {
        let json = r#"{
            "format": {"duration": "10.0"},
            "streams": [{"codec_type": "audio", "codec_name": "aac"}]
        }"#;
        let info = parse_probe_json(json).unwrap();
        assert_eq!(info.duration, 10.0);
        assert!(info.video_codec.is_none());
    }
}
