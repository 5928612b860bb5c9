use crate::store::Collection;

/// Decision requested for a pending record. Matching is exact and case-sensitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestStatus {
    Approved,
    Rejected,
    Unrecognized(String),
}

impl RequestStatus {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "approved" => Self::Approved,
            "rejected" => Self::Rejected,
            other => Self::Unrecognized(other.to_string()),
        }
    }

    /// Collection receiving the copy, if the status has one.
    pub fn destination(&self) -> Option<Collection> {
        match self {
            Self::Approved => Some(Collection::Approved),
            Self::Rejected => Some(Collection::Rejected),
            Self::Unrecognized(_) => None,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Unrecognized(raw) => raw,
        }
    }
}

/// What to do with a status that is neither `approved` nor `rejected`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnknownStatusPolicy {
    /// Refuse the update and leave the record pending.
    #[default]
    Reject,
    /// Delete the pending record without copying it anywhere.
    Discard,
}

impl UnknownStatusPolicy {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "reject" => Some(Self::Reject),
            "discard" => Some(Self::Discard),
            _ => None,
        }
    }
}

/// Read-only collections exposed by the listing endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Listing {
    Pending,
    Approved,
    Rejected,
    ApprovedHistory,
    RejectedHistory,
}

impl Listing {
    pub fn collection(&self) -> Collection {
        match self {
            Listing::Pending => Collection::Pending,
            Listing::Approved => Collection::Approved,
            Listing::Rejected => Collection::Rejected,
            Listing::ApprovedHistory => Collection::ApprovedHistory,
            Listing::RejectedHistory => Collection::RejectedHistory,
        }
    }
}

/// Result of a successful status update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionOutcome {
    Moved { destination: Collection },
    Discarded,
}
