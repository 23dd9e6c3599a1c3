use std::io::{
    BufReader,
    Write,
};

use flate2::{
    read::GzDecoder,
    write::GzEncoder,
    Compression,
};
use serde::{
    de::DeserializeOwned,
    Serialize,
};

use crate::core::KikuError;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

pub fn is_gzip(bytes: &[u8]) -> bool {
    bytes.starts_with(&GZIP_MAGIC)
}

/// Parses JSON, inflating it on the way when the bytes are gzip-compressed.
pub fn decode_json<T: DeserializeOwned>(path: &str, bytes: &[u8]) -> Result<T, KikuError> {
    if is_gzip(bytes) {
        let reader = BufReader::new(GzDecoder::new(bytes));
        serde_json::from_reader(reader).map_err(|e| KikuError::decode(path, e))
    } else {
        serde_json::from_slice(bytes).map_err(|e| KikuError::decode(path, e))
    }
}

pub fn encode_json_gz<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, KikuError> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    serde_json::to_writer(&mut encoder, value)?;
    encoder.flush()?;
    Ok(encoder.finish()?)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn test_decodes_plain_and_gzip() {
        let value: HashMap<String, Vec<String>> =
            HashMap::from([("語".to_string(), vec!["話".to_string()])]);

        let gz = encode_json_gz(&value).unwrap();
        assert!(is_gzip(&gz));
        let decoded: HashMap<String, Vec<String>> = decode_json("db.json.gz", &gz).unwrap();
        assert_eq!(decoded, value);

        let plain = serde_json::to_vec(&value).unwrap();
        assert!(!is_gzip(&plain));
        let decoded: HashMap<String, Vec<String>> = decode_json("db.json", &plain).unwrap();
        assert_eq!(decoded, value);
    }

    #[test]
    fn test_truncated_gzip_is_a_decode_error() {
        let gz = encode_json_gz(&vec!["日"; 64]).unwrap();
        let err = decode_json::<Vec<String>>("chunk.json.gz", &gz[..gz.len() / 2]).unwrap_err();
        assert!(matches!(err, KikuError::Decode { .. }));
    }
}
