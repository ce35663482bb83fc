//! Deterministic fake personal data for onboarded customers.
//!
//! Curated lists only; no external data sources.
//! All generation is deterministic (same RNG stream = same identity).

use crate::{config::InclusiveRange, rng::SimRng};
use chrono::{Days, Months, NaiveDate};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeIdentity {
    pub first_name: &'static str,
    pub last_name: &'static str,
    pub date_of_birth: NaiveDate,
    pub nationality: &'static str,
}

/// Deterministic identity generator using curated lists
pub struct IdentityGenerator;

impl IdentityGenerator {
    /// Generate a complete identity for a customer aged within `ages`
    /// on `as_of`.
    pub fn generate(rng: &mut SimRng, as_of: NaiveDate, ages: InclusiveRange) -> FakeIdentity {
        FakeIdentity {
            first_name: Self::first_name(rng),
            last_name: Self::last_name(rng),
            date_of_birth: Self::date_of_birth(rng, as_of, ages),
            nationality: Self::country(rng),
        }
    }

    pub fn first_name(rng: &mut SimRng) -> &'static str {
        *rng.pick(FIRST_NAMES)
    }

    pub fn last_name(rng: &mut SimRng) -> &'static str {
        *rng.pick(LAST_NAMES)
    }

    pub fn country(rng: &mut SimRng) -> &'static str {
        *rng.pick(COUNTRIES)
    }

    /// A birth date such that the customer's age on `as_of` lies in `ages`.
    pub fn date_of_birth(rng: &mut SimRng, as_of: NaiveDate, ages: InclusiveRange) -> NaiveDate {
        // Youngest possible birthday is exactly `min` years ago; the oldest
        // is one day short of `max + 1` years ago.
        let youngest = sub_years(as_of, ages.min);
        let oldest = sub_years(as_of, ages.max.saturating_add(1))
            .checked_add_days(Days::new(1))
            .unwrap_or(youngest);
        let span = (youngest - oldest).num_days().max(0) as u64;
        youngest
            .checked_sub_days(Days::new(rng.range_inclusive(0, span)))
            .unwrap_or(youngest)
    }
}

fn sub_years(date: NaiveDate, years: u64) -> NaiveDate {
    let months = u32::try_from(years.saturating_mul(12)).unwrap_or(u32::MAX);
    date.checked_sub_months(Months::new(months)).unwrap_or(NaiveDate::MIN)
}

const FIRST_NAMES: &[&str] = &[
    "Oliver", "George", "Harry", "Jack", "Jacob", "Noah", "Charlie", "Thomas",
    "Oscar", "William", "James", "Henry", "Leo", "Alfie", "Joshua", "Freddie",
    "Archie", "Ethan", "Isaac", "Alexander", "Joseph", "Edward", "Samuel", "Max",
    "Daniel", "Arthur", "Lucas", "Mohammed", "Logan", "Theo", "Harrison", "Benjamin",
    "Olivia", "Amelia", "Isla", "Ava", "Emily", "Sophia", "Grace", "Mia",
    "Poppy", "Ella", "Lily", "Evie", "Isabella", "Sophie", "Ivy", "Freya",
    "Harper", "Willow", "Charlotte", "Jessica", "Daisy", "Florence", "Ruby", "Alice",
    "Phoebe", "Matilda", "Sienna", "Eleanor", "Elsie", "Rosie", "Imogen", "Hannah",
];

const LAST_NAMES: &[&str] = &[
    "Smith", "Jones", "Taylor", "Brown", "Williams", "Wilson", "Johnson", "Davies",
    "Patel", "Robinson", "Wright", "Thompson", "Evans", "Walker", "White", "Roberts",
    "Green", "Hall", "Thomas", "Clarke", "Jackson", "Wood", "Harris", "Edwards",
    "Turner", "Martin", "Cooper", "Hill", "Ward", "Hughes", "Moore", "Clark",
    "King", "Harrison", "Lewis", "Baker", "Lee", "Allen", "Morris", "Khan",
    "Scott", "Watson", "Davis", "Parker", "James", "Bennett", "Young", "Phillips",
    "Richardson", "Mitchell", "Bailey", "Carter", "Cook", "Singh", "Shaw", "Bell",
    "Collins", "Morgan", "Kelly", "Begum", "Campbell", "Price", "Murphy", "Dubois",
];

const COUNTRIES: &[&str] = &[
    "France", "United Kingdom", "Germany", "Spain", "Italy", "Portugal",
    "Belgium", "Netherlands", "Luxembourg", "Switzerland", "Austria", "Ireland",
    "Denmark", "Sweden", "Norway", "Finland", "Poland", "Czech Republic",
    "Greece", "Romania", "Morocco", "Tunisia", "Algeria", "Senegal",
    "United States", "Canada", "Brazil", "Argentina", "Mexico", "Japan",
    "China", "India", "Singapore", "Hong Kong", "United Arab Emirates", "Saudi Arabia",
    "Turkey", "Israel", "South Africa", "Nigeria", "Australia", "New Zealand",
];

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    fn as_of() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    fn age_on(dob: NaiveDate, on: NaiveDate) -> i32 {
        let mut age = on.year() - dob.year();
        if (on.month(), on.day()) < (dob.month(), dob.day()) {
            age -= 1;
        }
        age
    }

    #[test]
    fn identity_generation_is_deterministic() {
        let ages = InclusiveRange::new(18, 90);
        let a = IdentityGenerator::generate(&mut SimRng::new(12345, 1), as_of(), ages);
        let b = IdentityGenerator::generate(&mut SimRng::new(12345, 1), as_of(), ages);
        assert_eq!(a, b, "Same stream should produce same identity");
    }

    #[test]
    fn ages_stay_within_range() {
        let ages = InclusiveRange::new(18, 90);
        let mut rng = SimRng::new(7, 0);
        for _ in 0..2_000 {
            let dob = IdentityGenerator::date_of_birth(&mut rng, as_of(), ages);
            let age = age_on(dob, as_of());
            assert!((18..=90).contains(&age), "age {age} for dob {dob}");
        }
    }

    #[test]
    fn huge_age_bound_saturates() {
        let mut rng = SimRng::new(4, 0);
        let youngest = NaiveDate::from_ymd_opt(2006, 1, 1).unwrap();
        for _ in 0..100 {
            let dob = IdentityGenerator::date_of_birth(&mut rng, as_of(), InclusiveRange::new(18, u64::MAX));
            assert!(dob <= youngest, "dob {dob}");
        }
    }

    #[test]
    fn names_are_non_empty() {
        let mut rng = SimRng::new(8, 0);
        for _ in 0..100 {
            let id = IdentityGenerator::generate(&mut rng, as_of(), InclusiveRange::new(18, 90));
            assert!(!id.first_name.is_empty());
            assert!(!id.last_name.is_empty());
            assert!(!id.nationality.is_empty());
        }
    }
}
