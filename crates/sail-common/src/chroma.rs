//! Chroma subsampling ratios reported by source images.

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChromaSubsampling {
    Unknown,
    /// No subsampling: full chroma resolution.
    Ratio444,
    Ratio440,
    Ratio422,
    Ratio420,
    Ratio411,
    Ratio410,
}

impl ChromaSubsampling {
    pub fn as_str(self) -> &'static str {
        use ChromaSubsampling::*;
        match self {
            Unknown => "UNKNOWN",
            Ratio444 => "444",
            Ratio440 => "440",
            Ratio422 => "422",
            Ratio420 => "420",
            Ratio411 => "411",
            Ratio410 => "410",
        }
    }

    pub fn from_str_strict(s: &str) -> Result<Self> {
        use ChromaSubsampling::*;
        Ok(match s {
            "UNKNOWN" => Unknown,
            "444" => Ratio444,
            "440" => Ratio440,
            "422" => Ratio422,
            "420" => Ratio420,
            "411" => Ratio411,
            "410" => Ratio410,
            _ => {
                return Err(Error::UnsupportedImageProperty(
                    "unrecognized chroma subsampling string",
                ))
            }
        })
    }
}

impl Default for ChromaSubsampling {
    fn default() -> Self {
        ChromaSubsampling::Unknown
    }
}

impl std::fmt::Display for ChromaSubsampling {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips() {
        for c in [
            ChromaSubsampling::Unknown,
            ChromaSubsampling::Ratio444,
            ChromaSubsampling::Ratio440,
            ChromaSubsampling::Ratio422,
            ChromaSubsampling::Ratio420,
            ChromaSubsampling::Ratio411,
            ChromaSubsampling::Ratio410,
        ] {
            assert_eq!(ChromaSubsampling::from_str_strict(c.as_str()).unwrap(), c);
        }
    }
}
