//! Target field registry for the analysis and sample datasets
//!
//! The registry is fixed at startup: every field the submission schema knows
//! about is declared here, together with its value type, whether a source
//! column must be bound to it, and how an unset field defaults in the
//! outgoing payload.

use std::collections::HashMap;

use once_cell::sync::Lazy;

/// Declared type of a target field's value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    Text,
    Number,
    Date,
}

/// Where a field's value comes from during row processing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldSource {
    /// Read from a mapped spreadsheet column
    Column,
    /// Filled by the reference resolver
    Reference,
    /// Computed by the derived field calculator
    Derived,
}

/// Default applied by the schema transformer when the field is unset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldDefault {
    Null,
    Zero,
    ReferenceDate,
}

/// One entry of the field registry
#[derive(Debug, Clone, Copy)]
pub struct FieldDef {
    pub name: &'static str,
    pub value_type: ValueType,
    pub source: FieldSource,
    pub required: bool,
    pub default: FieldDefault,
}

const fn column(name: &'static str, value_type: ValueType, required: bool) -> FieldDef {
    let default = match value_type {
        ValueType::Date => FieldDefault::ReferenceDate,
        _ => FieldDefault::Null,
    };
    FieldDef { name, value_type, source: FieldSource::Column, required, default }
}

const fn reference(name: &'static str, value_type: ValueType) -> FieldDef {
    FieldDef {
        name,
        value_type,
        source: FieldSource::Reference,
        required: false,
        default: FieldDefault::Null,
    }
}

const fn derived(name: &'static str, value_type: ValueType) -> FieldDef {
    FieldDef {
        name,
        value_type,
        source: FieldSource::Derived,
        required: false,
        default: FieldDefault::Null,
    }
}

/// Analysis dataset: raw lab measurements plus resolver- and
/// calculator-filled fields.
pub static ANALYSIS_FIELDS: &[FieldDef] = &[
    column("code", ValueType::Text, true),
    column("collection_date", ValueType::Date, false),
    column("ph", ValueType::Number, true),
    column("phosphorus", ValueType::Number, true),
    column("potassium_raw", ValueType::Number, true),
    column("calcium", ValueType::Number, true),
    column("magnesium", ValueType::Number, true),
    column("aluminum", ValueType::Number, true),
    column("potential_acidity", ValueType::Number, true),
    column("sulfur", ValueType::Number, false),
    column("zinc", ValueType::Number, false),
    column("boron", ValueType::Number, false),
    column("copper", ValueType::Number, false),
    column("iron", ValueType::Number, false),
    column("manganese", ValueType::Number, false),
    column("organic_matter", ValueType::Number, false),
    column("sand", ValueType::Number, true),
    column("silt", ValueType::Number, true),
    column("clay", ValueType::Number, true),
    reference("plot_id", ValueType::Text),
    reference("settlement", ValueType::Text),
    reference("city", ValueType::Text),
    reference("owner_name", ValueType::Text),
    reference("identification", ValueType::Text),
    reference("property", ValueType::Text),
    reference("area", ValueType::Number),
    derived("potassium", ValueType::Number),
    derived("sum_of_bases", ValueType::Number),
    derived("cec_effective", ValueType::Number),
    derived("cec_ph7", ValueType::Number),
    derived("base_saturation", ValueType::Number),
    derived("aluminum_saturation", ValueType::Number),
    derived("lime_requirement", ValueType::Number),
    derived("lime_requirement_plot", ValueType::Number),
    derived("phosphorus_deficit", ValueType::Number),
    derived("phosphorus_deficit_plot", ValueType::Number),
    derived("potassium_deficit", ValueType::Number),
    derived("potassium_deficit_plot", ValueType::Number),
    derived("texture_class", ValueType::Text),
    FieldDef {
        name: "is_deleted",
        value_type: ValueType::Number,
        source: FieldSource::Column,
        required: false,
        default: FieldDefault::Zero,
    },
];

/// Sample dataset: collection metadata plus producer-resolved fields.
pub static SAMPLE_FIELDS: &[FieldDef] = &[
    column("code", ValueType::Text, true),
    column("collection_date", ValueType::Date, false),
    column("depth_start", ValueType::Number, false),
    column("depth_end", ValueType::Number, false),
    column("description", ValueType::Text, false),
    reference("plot", ValueType::Text),
    reference("owner_name", ValueType::Text),
    reference("property", ValueType::Text),
    reference("settlement", ValueType::Text),
    FieldDef {
        name: "is_deleted",
        value_type: ValueType::Number,
        source: FieldSource::Reference,
        required: false,
        default: FieldDefault::Zero,
    },
];

static ANALYSIS_INDEX: Lazy<HashMap<&'static str, &'static FieldDef>> =
    Lazy::new(|| ANALYSIS_FIELDS.iter().map(|f| (f.name, f)).collect());
static SAMPLE_INDEX: Lazy<HashMap<&'static str, &'static FieldDef>> =
    Lazy::new(|| SAMPLE_FIELDS.iter().map(|f| (f.name, f)).collect());

/// The two dataset tabs the importer understands. Carries the field
/// registry, required-field set and endpoint names, so the pipeline can
/// branch exhaustively instead of comparing strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum DatasetKind {
    /// Laboratory analysis results
    Analysis,
    /// Field-collected sample metadata
    Sample,
}

impl DatasetKind {
    /// Remote endpoint segment for submissions and existence checks
    pub fn endpoint(&self) -> &'static str {
        match self {
            DatasetKind::Analysis => "analysis",
            DatasetKind::Sample => "sample",
        }
    }

    /// Full field registry (schema order)
    pub fn fields(&self) -> &'static [FieldDef] {
        match self {
            DatasetKind::Analysis => ANALYSIS_FIELDS,
            DatasetKind::Sample => SAMPLE_FIELDS,
        }
    }

    /// Fields that participate in column mapping
    pub fn mappable_fields(&self) -> impl Iterator<Item = &'static FieldDef> {
        self.fields().iter().filter(|f| f.source == FieldSource::Column)
    }

    /// Fields that must have a bound source column before a run starts
    pub fn required_fields(&self) -> impl Iterator<Item = &'static FieldDef> {
        self.mappable_fields().filter(|f| f.required)
    }

    /// Look up a field definition by target name
    pub fn field(&self, name: &str) -> Option<&'static FieldDef> {
        match self {
            DatasetKind::Analysis => ANALYSIS_INDEX.get(name).copied(),
            DatasetKind::Sample => SAMPLE_INDEX.get(name).copied(),
        }
    }
}

impl std::fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.endpoint())
    }
}
