use chrono::{DateTime, Utc};

use crate::core::models::TimelineEvent;

/// Whether a timeline event was created or updated strictly after `cutoff`.
///
/// Events carrying neither timestamp never count as recent.
#[must_use]
pub fn is_after_cutoff(event: &TimelineEvent, cutoff: DateTime<Utc>) -> bool {
    event.updated_at.is_some_and(|updated| updated > cutoff)
        || event.created_at.is_some_and(|created| created > cutoff)
}

/// Keeps only the events newer than `cutoff`, preserving order.
#[must_use]
pub fn filter_recent_events<I>(events: I, cutoff: DateTime<Utc>) -> Vec<TimelineEvent>
where
    I: IntoIterator<Item = TimelineEvent>,
{
    events
        .into_iter()
        .filter(|event| is_after_cutoff(event, cutoff))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn event(
        id: u64,
        created: Option<DateTime<Utc>>,
        updated: Option<DateTime<Utc>>,
    ) -> TimelineEvent {
        TimelineEvent {
            id: Some(id),
            created_at: created,
            updated_at: updated,
            ..TimelineEvent::default()
        }
    }

    #[test]
    fn keeps_only_events_updated_after_cutoff() {
        let cutoff = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let events = vec![
            event(1, None, Some(cutoff - Duration::hours(2))),
            event(2, None, Some(cutoff + Duration::hours(1))),
        ];

        let recent = filter_recent_events(events, cutoff);
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].id, Some(2));
    }

    #[test]
    fn falls_back_to_created_at_and_never_duplicates() {
        let cutoff = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let events = vec![
            event(1, Some(cutoff + Duration::minutes(5)), None),
            event(2, Some(cutoff + Duration::minutes(1)), Some(cutoff + Duration::minutes(9))),
            event(3, Some(cutoff), Some(cutoff)),
            event(4, None, None),
        ];

        let ids: Vec<Option<u64>> = filter_recent_events(events, cutoff)
            .into_iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(ids, vec![Some(1), Some(2)]);
    }
}
