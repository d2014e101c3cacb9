//! Column-name contract for the tidy measurement table.
//!
//! The analysis core depends only on these column names and their semantics,
//! not on how the table is produced. One row is one measurement of one signal
//! in one sample at one time point, plus the sample's grouping metadata.

pub const SAMPLE: &str = "Sample";
pub const SIGNAL: &str = "Signal";
pub const SIGNAL_ID: &str = "Signal_id";
pub const MEASUREMENT: &str = "Measurement";
pub const TIME: &str = "Time";
pub const ASSAY: &str = "Assay";
pub const STUDY: &str = "Study";
pub const MEDIA: &str = "Media";
pub const STRAIN: &str = "Strain";
pub const VECTOR: &str = "Vector";
pub const SUPPLEMENT: &str = "Supplement";
pub const CHEMICAL: &str = "Chemical";
pub const CHEMICAL_ID: &str = "Chemical_id";
pub const CONCENTRATION: &str = "Concentration";
pub const ROW: &str = "Row";
pub const COLUMN: &str = "Column";

/// Full column set of the collaborator interface.
pub const ALL: [&str; 16] = [
    SAMPLE,
    SIGNAL,
    SIGNAL_ID,
    MEASUREMENT,
    TIME,
    ASSAY,
    STUDY,
    MEDIA,
    STRAIN,
    VECTOR,
    SUPPLEMENT,
    CHEMICAL,
    CHEMICAL_ID,
    CONCENTRATION,
    ROW,
    COLUMN,
];

/// Columns every analysis requires to be present.
pub const REQUIRED: [&str; 4] = [SAMPLE, SIGNAL, MEASUREMENT, TIME];

/// The sentinel vector/strain name marking background control samples.
pub const CONTROL_NAME: &str = "none";
