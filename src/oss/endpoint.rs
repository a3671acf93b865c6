use std::fmt;

/// The OSS endpoints a bucket is reachable through
///
/// All three serve the same bucket; they differ in network path and in the
/// processing applied to reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// Public OSS endpoint
    Standard,
    /// Image-processing endpoint, resolves style suffixes like `@!thumb`
    Image,
    /// Intranet endpoint, only reachable from inside the region
    Internal,
}

impl Endpoint {
    /// Endpoint host for a region, without bucket or scheme
    pub fn host(&self, area: &str) -> String {
        match self {
            Endpoint::Standard => format!("oss-{}.aliyuncs.com", area),
            Endpoint::Image => format!("img-{}.aliyuncs.com", area),
            Endpoint::Internal => format!("oss-{}-internal.aliyuncs.com", area),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Endpoint::Standard => "standard",
            Endpoint::Image => "image",
            Endpoint::Internal => "internal",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
