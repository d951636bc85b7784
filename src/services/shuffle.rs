// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Unseeded shuffling and cosmetic relative timestamps for the feed.

use rand::Rng;

/// Return a uniformly random permutation of `items` (Fisher-Yates).
///
/// The input is left untouched. Not seeded: every call draws fresh entropy.
pub fn shuffle<T: Clone>(items: &[T]) -> Vec<T> {
    let mut shuffled = items.to_vec();
    let mut rng = rand::thread_rng();
    for i in (1..shuffled.len()).rev() {
        let j = rng.gen_range(0..=i);
        shuffled.swap(i, j);
    }
    shuffled
}

const HOURS: [&str; 23] = [
    "1h", "2h", "3h", "4h", "5h", "6h", "7h", "8h", "9h", "10h", "11h", "12h", "13h", "14h",
    "15h", "16h", "17h", "18h", "19h", "20h", "21h", "22h", "23h",
];
const DAYS: [&str; 6] = ["1d", "2d", "3d", "4d", "5d", "6d"];
const MINUTES: [&str; 3] = ["15m", "30m", "45m"];

/// Hour tokens appear twice in the weighted pool.
const HOUR_WEIGHT: usize = 2;
const POOL_SIZE: usize = HOURS.len() * HOUR_WEIGHT + DAYS.len() + MINUTES.len();

/// Token at `index` of the weighted pool: hours ×2, then days, then minutes.
fn weighted_token(index: usize) -> &'static str {
    let hours_end = HOURS.len() * HOUR_WEIGHT;
    let days_end = hours_end + DAYS.len();
    if index < hours_end {
        HOURS[index % HOURS.len()]
    } else if index < days_end {
        DAYS[index - hours_end]
    } else {
        MINUTES[index - days_end]
    }
}

/// A plausible recent relative time ("3h", "1d", "15m").
///
/// Purely cosmetic; never use it for ordering or persistence.
pub fn fake_timestamp() -> &'static str {
    weighted_token(rand::thread_rng().gen_range(0..POOL_SIZE))
}
