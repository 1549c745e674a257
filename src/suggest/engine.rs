//! Suggestion matching - directory filtering and candidate resolution
//!
//! Pure functions over a directory snapshot: case-insensitive substring
//! filtering against display name or email, the synthetic "everyone"
//! candidate, and the display-name fallback chain used when a candidate
//! is committed into the buffer as a mention token.

use serde::{Deserialize, Serialize};

use crate::markup::MentionToken;

/// Sentinel id of the synthetic broadcast candidate.
pub const EVERYONE_ID: &str = "everyone";
/// Fixed display name of the broadcast candidate.
pub const EVERYONE_LABEL: &str = "Everyone";

// ==================== TYPE DEFINITIONS ====================

/// One taggable participant, supplied by the host as a read-only snapshot.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub id: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub email: String,
}

/// One row of the suggestion popup.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Candidate {
    pub id: String,
    pub display_name: String,
    /// Absent for the synthetic "everyone" row.
    pub email: Option<String>,
}

impl Candidate {
    fn everyone() -> Self {
        Self {
            id: EVERYONE_ID.to_string(),
            display_name: EVERYONE_LABEL.to_string(),
            email: None,
        }
    }

    fn from_entry(entry: &DirectoryEntry) -> Self {
        Self {
            id: entry.id.clone(),
            display_name: entry.display_name.clone(),
            email: Some(entry.email.clone()),
        }
    }
}

// ==================== FILTERING ====================

/// Filter the directory against a query.
///
/// Case-insensitive substring match on display name OR email; an empty
/// query passes everything. The synthetic "everyone" candidate is always
/// element 0, regardless of whether the query matches anything.
pub fn filter_directory(directory: &[DirectoryEntry], query: &str) -> Vec<Candidate> {
    let needle = query.to_lowercase();
    let mut candidates = vec![Candidate::everyone()];

    for entry in directory {
        if needle.is_empty()
            || entry.display_name.to_lowercase().contains(&needle)
            || entry.email.to_lowercase().contains(&needle)
        {
            candidates.push(Candidate::from_entry(entry));
        }
    }

    candidates
}

/// Resolve a committed candidate into the token inserted into the buffer.
///
/// Display-name fallback chain for directory entries: display name, then
/// the local part of the email, then the literal `"User"`. Blank strings
/// count as absent.
pub fn resolve_candidate(candidate: &Candidate) -> MentionToken {
    if candidate.id == EVERYONE_ID {
        return MentionToken::new(EVERYONE_ID, EVERYONE_LABEL);
    }

    let name = candidate.display_name.trim();
    if !name.is_empty() {
        return MentionToken::new(&candidate.id, name);
    }

    if let Some(email) = &candidate.email {
        let local = email.split('@').next().unwrap_or("").trim();
        if !local.is_empty() {
            return MentionToken::new(&candidate.id, local);
        }
    }

    MentionToken::new(&candidate.id, "User")
}

// ==================== TESTS ====================
