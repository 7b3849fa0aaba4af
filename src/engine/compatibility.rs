/// Landmark used when no keywords are configured.
pub const DEFAULT_LANDMARK: &str = "universidad";

pub fn normalize_destination(destination: &str) -> String {
    destination.trim().to_lowercase()
}

/// Decides whether a driver and a passenger are headed to the same place.
///
/// Two destinations are compatible when their normalized text is equal, or when
/// both mention the same landmark keyword. The keyword rule is plain substring
/// containment and can pair unrelated places that share a keyword.
#[derive(Debug, Clone, PartialEq)]
pub struct DestinationRule {
    landmarks: Vec<String>,
}

impl Default for DestinationRule {
    fn default() -> Self {
        Self::new([DEFAULT_LANDMARK])
    }
}

impl DestinationRule {
    pub fn new<I, S>(landmarks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let landmarks = landmarks
            .into_iter()
            .map(|keyword| normalize_destination(keyword.as_ref()))
            .filter(|keyword| !keyword.is_empty())
            .collect();

        Self { landmarks }
    }

    pub fn landmarks(&self) -> &[String] {
        &self.landmarks
    }

    pub fn is_compatible(&self, driver_destination: &str, passenger_destination: &str) -> bool {
        let driver = normalize_destination(driver_destination);
        let passenger = normalize_destination(passenger_destination);

        if driver.is_empty() || passenger.is_empty() {
            return false;
        }

        if driver == passenger {
            return true;
        }

        self.landmarks
            .iter()
            .any(|keyword| driver.contains(keyword.as_str()) && passenger.contains(keyword.as_str()))
    }
}
