//! Flat-to-nested projection of the investor join.
//!
//! The store exports one row per investor/progress/note combination. Clients
//! fold those rows into one [`Investor`] per id.

use std::collections::HashMap;

use crate::model::{FlatRow, Investor, ProgressEntry};

/// Group flat join rows into nested investors.
///
/// Output order is the first-seen order of ids. Scalar fields come from the
/// first row seen for an id; later rows only contribute progress entries
/// (deduplicated on owner and stage) and, if none was set yet, the note.
#[must_use]
pub fn group_rows(rows: impl IntoIterator<Item = FlatRow>) -> Vec<Investor> {
    let mut investors: Vec<Investor> = Vec::new();
    let mut index: HashMap<i64, usize> = HashMap::new();

    for row in rows {
        let slot = *index.entry(row.id).or_insert_with(|| {
            investors.push(scalars_from(&row));
            investors.len() - 1
        });
        let investor = &mut investors[slot];

        if let (Some(owner), Some(stage)) = (row.owner_name, row.stage) {
            let seen = investor
                .owner_progress
                .iter()
                .any(|p| p.owner_name == owner && p.stage == stage);
            if !seen {
                investor.owner_progress.push(ProgressEntry {
                    owner_name: owner,
                    stage,
                    is_active: row.is_active.unwrap_or(false),
                });
            }
        }

        if investor.notes.is_none() {
            investor.notes = row.note_text;
        }
    }

    investors
}

fn scalars_from(row: &FlatRow) -> Investor {
    Investor {
        id: row.id,
        name: row.name.clone(),
        title: row.title.clone(),
        company: row.company.clone(),
        linkedin_url: row.linkedin_url.clone(),
        email: row.email.clone(),
        phone: row.phone.clone(),
        location: row.location.clone(),
        industry: row.industry.clone(),
        investment_stage: row.investment_stage.clone(),
        investment_size: row.investment_size.clone(),
        portfolio_companies: row.portfolio_companies.clone(),
        description: row.description.clone(),
        rating: row.rating.unwrap_or(0),
        owner_progress: Vec::new(),
        notes: None,
    }
}
