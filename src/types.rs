use garde::Validate;
use serde::Deserialize;
use serde::Serialize;
use std::fmt::Display;
use std::sync::Arc;

/// A single message left on the board.
///
/// Stars are immutable values: once accepted they travel through the write queue to the storage, and come back from
/// it as members of cache slots. Identity is assigned by the storage and never reaches this type.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Validate)]
pub struct Star {
    // Missing fields are treated as empty so that they fail validation instead of parsing.
    #[serde(default)]
    #[garde(length(min = 1))]
    pub name:    String,
    #[serde(default)]
    #[garde(length(min = 1))]
    pub message: String,
}

impl Star {
    pub fn new<N: Into<String>, M: Into<String>>(name: N, message: M) -> Self {
        Self {
            name:    name.into(),
            message: message.into(),
        }
    }
}

impl Display for Star {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.name, self.message)
    }
}

/// One precomputed batch of randomly sampled stars.
#[derive(Clone, Debug, Default)]
pub enum Slot {
    /// Never populated, or the last attempt to populate it failed.
    #[default]
    Empty,
    Ready(Arc<Vec<Star>>),
}

impl Slot {
    pub fn is_empty(&self) -> bool {
        matches!(self, Slot::Empty)
    }

    pub fn stars(&self) -> Option<&Arc<Vec<Star>>> {
        match self {
            Slot::Ready(stars) => Some(stars),
            Slot::Empty => None,
        }
    }

    pub fn into_stars(self) -> Option<Arc<Vec<Star>>> {
        match self {
            Slot::Ready(stars) => Some(stars),
            Slot::Empty => None,
        }
    }
}

/// The complete set of slots at a point in time. Snapshots are never mutated once published; a refresh produces a
/// brand new one via [`SnapshotBuilder`].
#[derive(Debug, Default)]
pub struct Snapshot {
    generation: u64,
    slots:      Vec<Slot>,
}

impl Snapshot {
    /// A snapshot of `slot_count` empty slots. Generation 0 means "nothing has been published yet".
    pub fn empty(slot_count: usize) -> Self {
        Self {
            generation: 0,
            slots:      vec![Slot::Empty; slot_count],
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Out-of-range indices are reported as empty slots.
    pub fn slot(&self, index: usize) -> Slot {
        self.slots.get(index).cloned().unwrap_or_default()
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn ready_count(&self) -> usize {
        self.slots.iter().filter(|s| !s.is_empty()).count()
    }
}

/// Constructs a [`Snapshot`] off to the side so it can be published as a whole.
#[derive(Debug)]
pub struct SnapshotBuilder {
    slots: Vec<Slot>,
}

impl SnapshotBuilder {
    pub fn new(slot_count: usize) -> Self {
        Self {
            slots: vec![Slot::Empty; slot_count],
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Fill the slot at `index`. Indices beyond the configured slot count are ignored.
    pub fn fill(&mut self, index: usize, stars: Vec<Star>) -> &mut Self {
        if let Some(slot) = self.slots.get_mut(index) {
            *slot = Slot::Ready(Arc::new(stars));
        }
        self
    }

    pub fn mark_empty(&mut self, index: usize) -> &mut Self {
        if let Some(slot) = self.slots.get_mut(index) {
            *slot = Slot::Empty;
        }
        self
    }

    pub fn build(self, generation: u64) -> Snapshot {
        Snapshot {
            generation,
            slots: self.slots,
        }
    }
}

/// Result of an attempt to put a star on the write queue.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EnqueueOutcome {
    Accepted,
    /// The queue stayed full for the whole timeout. The star is handed back to the caller.
    Rejected(Star),
    /// The consumer side is gone; happens only after shutdown.
    Closed(Star),
}

/// What the write path tells its caller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CreateOutcome {
    /// Queued for persistence. Not a durability guarantee.
    Accepted,
    /// Backpressure: try again later.
    Rejected,
    Invalid(String),
}

pub const DONATION_NAME_MESSAGE: &str = "name must not be null";
pub const DONATION_AMOUNT_MESSAGE: &str = "amount must be greater than 0";
pub const DONATION_TAX_DETAILS_MESSAGE: &str = "fullname, email, and national_id must not be empty or null";

/// A donation pledge. Unlike stars, donations are written straight to the storage and never cached.
///
/// Claiming a tax deduction requires the donor's full name, email and national ID.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct Donation {
    #[serde(default)]
    #[garde(length(min = 1))]
    pub name:          String,
    #[serde(default)]
    #[garde(custom(Self::positive))]
    pub amount:        f32,
    #[serde(default)]
    #[garde(custom(Self::tax_details(&self.fullname, &self.email, &self.national_id)))]
    pub tax_deduction: bool,
    #[serde(default)]
    #[garde(skip)]
    pub national_id:   Option<String>,
    #[serde(default)]
    #[garde(skip)]
    pub fullname:      Option<String>,
    #[serde(default)]
    #[garde(skip)]
    pub email:         Option<String>,
    /// Reference to an uploaded bill, if any.
    #[serde(default)]
    #[garde(skip)]
    pub bill:          Option<String>,
}

impl Donation {
    pub fn new<N: Into<String>>(name: N, amount: f32) -> Self {
        Self {
            name: name.into(),
            amount,
            ..Default::default()
        }
    }

    /// Claim a tax deduction with the given donor details.
    pub fn with_tax_deduction<F, E, I>(mut self, fullname: F, email: E, national_id: I) -> Self
    where
        F: Into<String>,
        E: Into<String>,
        I: Into<String>,
    {
        self.tax_deduction = true;
        self.fullname = Some(fullname.into());
        self.email = Some(email.into());
        self.national_id = Some(national_id.into());
        self
    }

    fn positive(value: &f32, _: &()) -> garde::Result {
        // NaN fails too.
        if *value > 0.0 {
            Ok(())
        }
        else {
            Err(garde::Error::new(DONATION_AMOUNT_MESSAGE))
        }
    }

    fn tax_details<'a>(
        fullname: &'a Option<String>,
        email: &'a Option<String>,
        national_id: &'a Option<String>,
    ) -> impl FnOnce(&bool, &()) -> garde::Result + 'a {
        move |required: &bool, _: &()| {
            let present = |field: &Option<String>| field.as_deref().is_some_and(|v| !v.is_empty());
            if !*required || (present(fullname) && present(email) && present(national_id)) {
                Ok(())
            }
            else {
                Err(garde::Error::new(DONATION_TAX_DETAILS_MESSAGE))
            }
        }
    }

    /// Validate and reduce the outcome to the message of the first failed rule, in the order name, amount, tax
    /// details.
    pub fn check(&self) -> Result<(), &'static str> {
        let Err(report) = self.validate()
        else {
            return Ok(());
        };

        let failed = |field: &str| report.iter().any(|(path, _)| path.to_string() == field);
        Err(if failed("name") {
            DONATION_NAME_MESSAGE
        }
        else if failed("amount") {
            DONATION_AMOUNT_MESSAGE
        }
        else {
            DONATION_TAX_DETAILS_MESSAGE
        })
    }
}

/// What the donation path tells its caller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DonateOutcome {
    /// Stored.
    Created,
    Invalid(&'static str),
    /// The storage refused the row.
    Failed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_star_validation() {
        assert!(Star::new("alice", "hi").validate().is_ok());
        assert!(Star::new("", "hi").validate().is_err());
        assert!(Star::new("alice", "").validate().is_err());
    }

    #[test]
    fn test_star_missing_fields_are_empty() {
        let star: Star = serde_json::from_str(r#"{"name": "bob"}"#).unwrap();
        assert_eq!(star, Star::new("bob", ""));
        assert!(star.validate().is_err());
    }

    #[test]
    fn test_donation_rules() {
        assert_eq!(Donation::new("ann", 10.0).check(), Ok(()));
        assert_eq!(Donation::new("", 10.0).check(), Err(DONATION_NAME_MESSAGE));
        assert_eq!(Donation::new("ann", 0.0).check(), Err(DONATION_AMOUNT_MESSAGE));
        assert_eq!(Donation::new("ann", -3.5).check(), Err(DONATION_AMOUNT_MESSAGE));
        // Name is reported first when several rules fail.
        assert_eq!(Donation::new("", -1.0).check(), Err(DONATION_NAME_MESSAGE));

        let claimed = Donation::new("ann", 5.0).with_tax_deduction("Ann Lee", "ann@example.com", "1234");
        assert_eq!(claimed.check(), Ok(()));

        let mut missing = claimed.clone();
        missing.email = None;
        assert_eq!(missing.check(), Err(DONATION_TAX_DETAILS_MESSAGE));

        let mut blank = claimed.clone();
        blank.national_id = Some(String::new());
        assert_eq!(blank.check(), Err(DONATION_TAX_DETAILS_MESSAGE));

        // Details are only required when the deduction is claimed.
        let mut unclaimed = missing;
        unclaimed.tax_deduction = false;
        assert_eq!(unclaimed.check(), Ok(()));
    }

    #[test]
    fn test_donation_from_json() {
        let donation: Donation =
            serde_json::from_str(r#"{"name": "bo", "amount": 2.5, "tax_deduction": true, "email": null}"#).unwrap();
        assert_eq!(donation.amount, 2.5);
        assert!(donation.tax_deduction);
        assert_eq!(donation.email, None);
        assert_eq!(donation.check(), Err(DONATION_TAX_DETAILS_MESSAGE));
    }

    #[test]
    fn test_star_json_shape() {
        let json = serde_json::to_value(Star::new("n", "m")).unwrap();
        assert_eq!(json, serde_json::json!({"name": "n", "message": "m"}));
    }

    #[test]
    fn test_snapshot_builder() {
        let mut builder = SnapshotBuilder::new(3);
        builder
            .fill(0, vec![Star::new("a", "1")])
            .fill(2, vec![Star::new("b", "2"), Star::new("c", "3")])
            .fill(5, vec![Star::new("x", "out of range")]);
        let snapshot = builder.build(7);

        assert_eq!(snapshot.generation(), 7);
        assert_eq!(snapshot.len(), 3);
        assert_eq!(snapshot.ready_count(), 2);
        assert!(snapshot.slot(1).is_empty());
        assert!(snapshot.slot(5).is_empty());
        assert_eq!(snapshot.slot(2).stars().map(|s| s.len()), Some(2));
    }

    #[test]
    fn test_mark_empty_clears_slot() {
        let mut builder = SnapshotBuilder::new(1);
        builder.fill(0, vec![Star::new("a", "1")]).mark_empty(0);
        assert!(builder.build(1).slot(0).is_empty());
    }
}
