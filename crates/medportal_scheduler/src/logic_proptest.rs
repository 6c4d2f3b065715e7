#[cfg(test)]
mod tests {
    use crate::logic::{available_slots, SlotPolicy};
    use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
    use proptest::prelude::*;

    const ALL_DAYS: [Weekday; 7] = [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
        Weekday::Sun,
    ];

    fn policy(start_hour: u32, end_hour: u32, step_minutes: i64) -> SlotPolicy {
        SlotPolicy::new(
            NaiveTime::from_hms_opt(start_hour, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(end_hour, 0, 0).unwrap(),
            step_minutes,
            ALL_DAYS.to_vec(),
        )
        .unwrap()
    }

    fn date(day_offset: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 1).unwrap() + Duration::days(day_offset)
    }

    proptest! {
        // Every candidate lies inside the window, on the grid, and ends by work_end
        #[test]
        fn test_candidates_respect_window(
            start_hour in 0..12u32,
            end_hour in 13..24u32,
            step_minutes in 5..120i64,
            day_offset in 0..365i64,
        ) {
            let policy = policy(start_hour, end_hour, step_minutes);
            let day = date(day_offset);
            let slots = policy.candidate_slots(day);

            prop_assert!(!slots.is_empty());
            for slot in &slots {
                prop_assert_eq!(slot.date(), day);
                prop_assert!(slot.time() >= policy.work_start);
                prop_assert!(*slot + policy.step <= day.and_time(policy.work_end));
                prop_assert!(policy.is_slot(*slot));
            }
            prop_assert!(slots.windows(2).all(|w| w[0] < w[1]));
        }

        // Available slots never include a booked time or a time before now
        #[test]
        fn test_available_slots_exclude_booked_and_past(
            booked_idx in proptest::collection::vec(0..16usize, 0..16),
            now_minutes in 0..(24 * 60i64),
        ) {
            let policy = SlotPolicy::default();
            let day = date(9);
            let candidates = policy.candidate_slots(day);
            let booked: Vec<NaiveDateTime> = booked_idx.iter().map(|i| candidates[*i]).collect();
            let now = day.and_time(NaiveTime::MIN) + Duration::minutes(now_minutes);

            let free = available_slots(&candidates, &booked, now);

            for slot in &free {
                prop_assert!(*slot >= now);
                prop_assert!(!booked.contains(slot));
            }
            let expected = candidates
                .iter()
                .filter(|c| **c >= now && !booked.contains(c))
                .count();
            prop_assert_eq!(free.len(), expected);
        }
    }
}
