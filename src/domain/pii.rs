//! PII type and detection candidate models

use serde::{Deserialize, Serialize};

/// Closed set of PII categories recognized by the detector
///
/// Every consumer match over this enum is exhaustive, so adding a category
/// forces each switch to be updated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PiiType {
    /// Email addresses
    Email,
    /// Telephone numbers
    Phone,
    /// Payment card numbers
    CreditCard,
    /// Social Security Numbers
    Ssn,
    /// Street addresses
    Address,
    /// Order references (e.g. ORD-ABC123456)
    OrderId,
    /// Shipment tracking numbers
    TrackingNumber,
    /// Support ticket references
    TicketId,
    /// Customer account references
    CustomerId,
    /// IPv4 addresses
    IpAddress,
    /// Person names
    Name,
    /// ZIP/postal codes
    ZipCode,
    /// Bank/loyalty account numbers
    AccountNumber,
}

impl PiiType {
    /// Every category, for closed-set iteration (e.g. partitioned lookups)
    pub const ALL: [PiiType; 13] = [
        PiiType::Email,
        PiiType::Phone,
        PiiType::CreditCard,
        PiiType::Ssn,
        PiiType::Address,
        PiiType::OrderId,
        PiiType::TrackingNumber,
        PiiType::TicketId,
        PiiType::CustomerId,
        PiiType::IpAddress,
        PiiType::Name,
        PiiType::ZipCode,
        PiiType::AccountNumber,
    ];

    /// Get human-readable label for the category
    pub fn label(&self) -> &'static str {
        match self {
            Self::Email => "EMAIL",
            Self::Phone => "PHONE",
            Self::CreditCard => "CREDIT_CARD",
            Self::Ssn => "SSN",
            Self::Address => "ADDRESS",
            Self::OrderId => "ORDER_ID",
            Self::TrackingNumber => "TRACKING_NUMBER",
            Self::TicketId => "TICKET_ID",
            Self::CustomerId => "CUSTOMER_ID",
            Self::IpAddress => "IP_ADDRESS",
            Self::Name => "NAME",
            Self::ZipCode => "ZIP_CODE",
            Self::AccountNumber => "ACCOUNT_NUMBER",
        }
    }

    /// Parse a category label as used in the pattern library
    pub fn parse(s: &str) -> Option<PiiType> {
        match s.to_uppercase().as_str() {
            "EMAIL" => Some(Self::Email),
            "PHONE" => Some(Self::Phone),
            "CREDIT_CARD" => Some(Self::CreditCard),
            "SSN" => Some(Self::Ssn),
            "ADDRESS" => Some(Self::Address),
            "ORDER_ID" => Some(Self::OrderId),
            "TRACKING_NUMBER" => Some(Self::TrackingNumber),
            "TICKET_ID" => Some(Self::TicketId),
            "CUSTOMER_ID" => Some(Self::CustomerId),
            "IP_ADDRESS" => Some(Self::IpAddress),
            "NAME" => Some(Self::Name),
            "ZIP_CODE" => Some(Self::ZipCode),
            "ACCOUNT_NUMBER" => Some(Self::AccountNumber),
            _ => None,
        }
    }
}

impl std::fmt::Display for PiiType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// A single PII span found by the detector
///
/// Candidates are ephemeral: produced and consumed within one `detect()` or
/// `tokenize()` call, never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct PiiCandidate {
    /// Category of the detected span
    pub pii_type: PiiType,
    /// The matched substring
    pub value: String,
    /// Byte offset of the span start in the scanned text
    pub start: usize,
    /// Byte offset one past the span end (`start < end` always holds)
    pub end: usize,
    /// Detection confidence (0.0 - 1.0)
    pub confidence: f64,
}

impl PiiCandidate {
    /// Create a new candidate with the confidence clamped to [0.0, 1.0]
    pub fn new(pii_type: PiiType, value: String, start: usize, end: usize, confidence: f64) -> Self {
        debug_assert!(start < end, "candidate span must be non-empty");
        Self {
            pii_type,
            value,
            start,
            end,
            confidence: confidence.clamp(0.0, 1.0),
        }
    }

    /// Span length in bytes
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Whether this span intersects another `[start, end)` range
    pub fn overlaps(&self, other: &PiiCandidate) -> bool {
        self.start < other.end && other.start < self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_round_trip() {
        for pii_type in PiiType::ALL {
            assert_eq!(PiiType::parse(pii_type.label()), Some(pii_type));
        }
    }

    #[test]
    fn test_parse_case_insensitive() {
        assert_eq!(PiiType::parse("email"), Some(PiiType::Email));
        assert_eq!(PiiType::parse("Order_Id"), Some(PiiType::OrderId));
        assert_eq!(PiiType::parse("bogus"), None);
    }

    #[test]
    fn test_candidate_confidence_clamped() {
        let c = PiiCandidate::new(PiiType::Email, "a@b.co".to_string(), 0, 6, 1.7);
        assert_eq!(c.confidence, 1.0);
    }

    #[test]
    fn test_candidate_overlap() {
        let a = PiiCandidate::new(PiiType::Phone, "555-123-4567".to_string(), 10, 22, 0.7);
        let b = PiiCandidate::new(PiiType::Ssn, "123-45-6789".to_string(), 14, 25, 0.7);
        let c = PiiCandidate::new(PiiType::Email, "x@y.io".to_string(), 30, 36, 0.9);

        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
        assert!(!a.overlaps(&c));
    }

    #[test]
    fn test_candidate_len() {
        let c = PiiCandidate::new(PiiType::ZipCode, "94110".to_string(), 5, 10, 0.5);
        assert_eq!(c.len(), 5);
    }
}
