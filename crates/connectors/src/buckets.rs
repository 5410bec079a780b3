//! Chart bucket labels per date range.

use webpro_core::DateRange;

const INTRADAY: [&str; 8] = [
    "00:00", "03:00", "06:00", "09:00", "12:00", "15:00", "18:00", "21:00",
];
const WEEKDAYS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketScheme {
    /// 3-hour slots / weekdays / `Day 1..=15`.
    Standard,
    /// Like `Standard` but monthly buckets are bare odd day numbers `1, 3, .., 29`.
    OddDayNumbers,
    /// Weekdays / `Week 1..=4` / `Day 1, 3, .., 23`.
    BusinessProfile,
}

impl BucketScheme {
    pub fn labels(&self, range: DateRange) -> Vec<String> {
        match (self, range) {
            (BucketScheme::BusinessProfile, DateRange::Daily) => owned(&WEEKDAYS),
            (BucketScheme::BusinessProfile, DateRange::Weekly) => {
                (1..=4).map(|i| format!("Week {i}")).collect()
            }
            (BucketScheme::BusinessProfile, DateRange::Monthly) => {
                (0..12).map(|i| format!("Day {}", i * 2 + 1)).collect()
            }
            (_, DateRange::Daily) => owned(&INTRADAY),
            (_, DateRange::Weekly) => owned(&WEEKDAYS),
            (BucketScheme::OddDayNumbers, DateRange::Monthly) => {
                (0..15).map(|i| (i * 2 + 1).to_string()).collect()
            }
            (BucketScheme::Standard, DateRange::Monthly) => {
                (1..=15).map(|i| format!("Day {i}")).collect()
            }
        }
    }

    pub fn bucket_count(&self, range: DateRange) -> usize {
        match (self, range) {
            (BucketScheme::BusinessProfile, DateRange::Daily) => 7,
            (BucketScheme::BusinessProfile, DateRange::Weekly) => 4,
            (BucketScheme::BusinessProfile, DateRange::Monthly) => 12,
            (_, DateRange::Daily) => 8,
            (_, DateRange::Weekly) => 7,
            (_, DateRange::Monthly) => 15,
        }
    }
}

fn owned(labels: &[&str]) -> Vec<String> {
    labels.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_labels() {
        let s = BucketScheme::Standard;
        assert_eq!(s.labels(DateRange::Daily).first().unwrap(), "00:00");
        assert_eq!(s.labels(DateRange::Daily).last().unwrap(), "21:00");
        assert_eq!(s.labels(DateRange::Weekly), owned(&WEEKDAYS));
        let monthly = s.labels(DateRange::Monthly);
        assert_eq!(monthly.len(), 15);
        assert_eq!(monthly[14], "Day 15");
    }

    #[test]
    fn test_odd_day_numbers() {
        let monthly = BucketScheme::OddDayNumbers.labels(DateRange::Monthly);
        assert_eq!(monthly.first().unwrap(), "1");
        assert_eq!(monthly.last().unwrap(), "29");
    }

    #[test]
    fn test_business_profile_labels() {
        let s = BucketScheme::BusinessProfile;
        assert_eq!(s.labels(DateRange::Daily), owned(&WEEKDAYS));
        assert_eq!(s.labels(DateRange::Weekly)[3], "Week 4");
        assert_eq!(s.labels(DateRange::Monthly)[11], "Day 23");
    }

    #[test]
    fn test_counts_match_labels() {
        for scheme in [
            BucketScheme::Standard,
            BucketScheme::OddDayNumbers,
            BucketScheme::BusinessProfile,
        ] {
            for range in [DateRange::Daily, DateRange::Weekly, DateRange::Monthly] {
                assert_eq!(scheme.labels(range).len(), scheme.bucket_count(range));
            }
        }
    }
}
