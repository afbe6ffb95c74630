//! Labeled heart dataset
//!
//! Loads the training CSV (one row per patient, 0/1 `target` column), converts
//! each row into a typed `PatientRecord` and provides the seeded shuffle-split
//! used by training.

use csv::{ReaderBuilder, Trim};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

use crate::error::RiskError;
use crate::schema::Field;
use crate::types::{PatientRecord, Sex, YesNo};

/// One CSV row as written in the dataset
#[derive(Debug, Deserialize)]
struct DatasetRow {
    age: f64,
    sex: f64,
    #[serde(rename = "chest pain type")]
    chest_pain_type: f64,
    #[serde(rename = "resting bp s")]
    resting_bp: f64,
    cholesterol: f64,
    #[serde(rename = "fasting blood sugar")]
    fasting_blood_sugar: f64,
    #[serde(rename = "resting ecg")]
    resting_ecg: f64,
    #[serde(rename = "max heart rate")]
    max_heart_rate: f64,
    #[serde(rename = "exercise angina")]
    exercise_angina: f64,
    oldpeak: f64,
    #[serde(rename = "ST slope")]
    st_slope: f64,
    target: f64,
}

impl DatasetRow {
    fn into_labeled(self, line: usize) -> Result<(PatientRecord, u8), RiskError> {
        let sex = Sex::from_code(small_code(self.sex, Field::Sex, line)?)
            .ok_or_else(|| invalid(line, "sex must be 0 or 1"))?;
        let fbs = YesNo::from_code(small_code(self.fasting_blood_sugar, Field::FastingBloodSugar, line)?)
            .ok_or_else(|| invalid(line, "fasting blood sugar must be 0 or 1"))?;
        let exang = YesNo::from_code(small_code(self.exercise_angina, Field::ExerciseAngina, line)?)
            .ok_or_else(|| invalid(line, "exercise angina must be 0 or 1"))?;
        if !self.oldpeak.is_finite() {
            return Err(invalid(line, "oldpeak is not a number"));
        }

        let record = PatientRecord {
            age: whole(self.age, Field::Age, line)?,
            sex,
            chest_pain_type: small_code(self.chest_pain_type, Field::ChestPainType, line)?,
            resting_bp: whole(self.resting_bp, Field::RestingBp, line)?,
            cholesterol: whole(self.cholesterol, Field::Cholesterol, line)?,
            fasting_blood_sugar: fbs,
            resting_ecg: small_code(self.resting_ecg, Field::RestingEcg, line)?,
            max_heart_rate: whole(self.max_heart_rate, Field::MaxHeartRate, line)?,
            exercise_angina: exang,
            oldpeak: self.oldpeak,
            st_slope: small_code(self.st_slope, Field::StSlope, line)?,
        };

        let label = match self.target {
            t if t == 0.0 => 0,
            t if t == 1.0 => 1,
            t => return Err(invalid(line, &format!("target must be 0 or 1, got {t}"))),
        };

        Ok((record, label))
    }
}

fn invalid(line: usize, reason: &str) -> RiskError {
    RiskError::Dataset(format!("line {line}: {reason}"))
}

fn whole(value: f64, field: Field, line: usize) -> Result<u32, RiskError> {
    if value.fract() != 0.0 || !(0.0..=f64::from(u32::MAX)).contains(&value) {
        return Err(invalid(
            line,
            &format!("{} must be a non-negative integer, got {value}", field.dataset_column()),
        ));
    }
    Ok(value as u32)
}

fn small_code(value: f64, field: Field, line: usize) -> Result<u8, RiskError> {
    if value.fract() != 0.0 || !(0.0..=f64::from(u8::MAX)).contains(&value) {
        return Err(invalid(
            line,
            &format!("{} must be a category code, got {value}", field.dataset_column()),
        ));
    }
    Ok(value as u8)
}

/// Patient records with their 0/1 disease labels
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabeledDataset {
    records: Vec<PatientRecord>,
    labels: Vec<u8>,
}

impl LabeledDataset {
    /// Pair records with labels.
    ///
    /// # Errors
    /// Returns `Dataset` if the lengths differ or a label is not 0/1.
    pub fn new(records: Vec<PatientRecord>, labels: Vec<u8>) -> Result<Self, RiskError> {
        if records.len() != labels.len() {
            return Err(RiskError::Dataset(format!(
                "{} records but {} labels",
                records.len(),
                labels.len()
            )));
        }
        if labels.iter().any(|l| *l > 1) {
            return Err(RiskError::Dataset("labels must be 0 or 1".to_string()));
        }
        Ok(Self { records, labels })
    }

    /// Load the dataset CSV from disk
    pub fn load(path: &Path) -> Result<Self, RiskError> {
        let file = std::fs::File::open(path)?;
        let dataset = Self::from_reader(file)?;
        info!(
            path = %path.display(),
            rows = dataset.len(),
            positives = dataset.positives(),
            "loaded dataset"
        );
        Ok(dataset)
    }

    /// Parse dataset CSV from any reader (header row required)
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, RiskError> {
        let mut rdr = ReaderBuilder::new().trim(Trim::All).from_reader(reader);

        let mut records = Vec::new();
        let mut labels = Vec::new();
        for (i, result) in rdr.deserialize().enumerate() {
            let row: DatasetRow = result?;
            // line 1 is the header
            let (record, label) = row.into_labeled(i + 2)?;
            records.push(record);
            labels.push(label);
        }

        if records.is_empty() {
            return Err(RiskError::Dataset("dataset has no rows".to_string()));
        }
        Ok(Self { records, labels })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[PatientRecord] {
        &self.records
    }

    pub fn labels(&self) -> &[u8] {
        &self.labels
    }

    /// Number of rows labelled 1
    pub fn positives(&self) -> usize {
        self.labels.iter().filter(|l| **l == 1).count()
    }

    /// Shuffle with a fixed seed and split off a test partition.
    ///
    /// The test partition gets `ceil(len * test_fraction)` rows; both partitions
    /// are guaranteed non-empty.
    ///
    /// # Errors
    /// Returns `Config` if the fraction is outside (0, 1) and `Dataset` if the
    /// dataset is too small to leave rows on both sides.
    pub fn split(&self, test_fraction: f64, seed: u64) -> Result<(Self, Self), RiskError> {
        if !(test_fraction > 0.0 && test_fraction < 1.0) {
            return Err(RiskError::Config(format!(
                "test fraction must be between 0 and 1, got {test_fraction}"
            )));
        }

        let n = self.len();
        let n_test = (n as f64 * test_fraction).ceil() as usize;
        if n_test == 0 || n_test >= n {
            return Err(RiskError::Dataset(format!(
                "cannot split {n} rows with test fraction {test_fraction}"
            )));
        }

        let mut indices: Vec<usize> = (0..n).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        indices.shuffle(&mut rng);

        let (test_idx, train_idx) = indices.split_at(n_test);
        debug!(train = train_idx.len(), test = test_idx.len(), seed, "split dataset");
        Ok((self.subset(train_idx), self.subset(test_idx)))
    }

    fn subset(&self, indices: &[usize]) -> Self {
        Self {
            records: indices.iter().map(|i| self.records[*i].clone()).collect(),
            labels: indices.iter().map(|i| self.labels[*i]).collect(),
        }
    }

    /// Category values seen for each categorical field
    pub fn categories(&self) -> BTreeMap<Field, BTreeSet<u8>> {
        let mut categories: BTreeMap<Field, BTreeSet<u8>> = BTreeMap::new();
        for record in &self.records {
            for field in Field::CATEGORICAL {
                if let Some(value) = record.category(field) {
                    categories.entry(field).or_default().insert(value);
                }
            }
        }
        categories
    }
}

/// Small dataset shared by the training and pipeline tests
#[cfg(test)]
pub(crate) const SAMPLE_CSV: &str = "\
age,sex,chest pain type,resting bp s,cholesterol,fasting blood sugar,resting ecg,max heart rate,exercise angina,oldpeak,ST slope,target
40,1,2,140,289,0,0,172,0,0.0,1,0
49,0,3,160,180,0,0,156,0,1.0,2,1
37,1,2,130,283,0,1,98,0,0.0,1,0
48,0,4,138,214,0,0,108,1,1.5,2,1
54,1,3,150,195,0,0,122,0,0.0,1,0
39,1,3,120,339,0,0,170,0,0.0,1,0
45,0,2,130,237,0,0,170,0,0.0,1,0
54,1,2,110,208,0,0,142,0,0.0,1,0
37,1,4,140,207,0,0,130,1,1.5,2,1
48,0,2,120,284,0,0,120,0,0.0,1,0
58,1,4,136,164,0,1,99,1,2.0,2,1
39,1,2,120,204,0,0,145,0,0.0,1,0
49,1,4,140,234,0,0,140,1,1.0,2,1
42,0,3,115,211,0,1,137,0,0.0,1,0
54,0,2,120,273,0,0,150,0,1.5,2,0
38,1,4,110,196,0,0,166,0,0.0,2,1
43,0,2,120,201,0,0,165,0,0.0,1,0
60,1,4,100,248,0,0,125,0,1.0,2,1
36,1,3,120,267,0,0,160,0,3.0,2,1
43,0,1,100,223,0,0,142,0,0.0,1,0
44,1,2,120,184,0,0,142,0,1.0,2,0
49,0,2,124,201,0,0,164,0,0.0,1,0
44,1,2,150,288,0,0,150,1,3.0,2,1
40,1,3,130,215,0,0,138,0,0.0,1,0
36,1,3,130,209,0,0,178,0,0.0,1,0
53,1,4,124,260,0,1,112,1,3.0,2,0
52,1,2,120,284,0,0,118,0,0.0,1,0
53,0,2,113,468,0,0,127,0,0.0,1,0
51,1,2,125,188,0,0,145,0,0.0,1,0
53,1,3,145,518,0,0,130,0,0.0,2,1
56,1,3,130,167,0,0,114,0,0.0,1,0
54,1,4,125,224,0,0,122,0,2.0,2,1
41,1,4,130,172,0,1,130,0,2.0,2,1
43,0,2,150,186,0,0,154,0,0.0,1,0
65,1,4,140,306,1,0,87,1,1.5,2,1
41,0,2,110,250,0,1,142,0,0.0,1,0
48,0,2,120,177,1,1,148,0,0.0,1,0
48,0,4,150,227,0,0,130,1,1.0,2,0
54,0,2,150,230,0,0,130,0,0.0,1,0
54,0,3,130,294,0,1,100,1,0.0,2,1
";

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parses_sample() {
        let dataset = LabeledDataset::from_reader(SAMPLE_CSV.as_bytes()).unwrap();
        assert_eq!(dataset.len(), 40);
        assert_eq!(dataset.positives(), 14);

        let first = &dataset.records()[0];
        assert_eq!(first.age, 40);
        assert_eq!(first.sex, Sex::Male);
        assert_eq!(first.chest_pain_type, 2);
        assert_eq!(first.max_heart_rate, 172);
        assert_eq!(dataset.labels()[0], 0);
    }

    #[test]
    fn test_rejects_bad_codes() {
        let header = SAMPLE_CSV.lines().next().unwrap();
        let bad_sex = format!("{header}\n40,2,2,140,289,0,0,172,0,0.0,1,0\n");
        let err = LabeledDataset::from_reader(bad_sex.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("line 2"));

        let bad_target = format!("{header}\n40,1,2,140,289,0,0,172,0,0.0,1,3\n");
        assert!(LabeledDataset::from_reader(bad_target.as_bytes()).is_err());

        let fractional = format!("{header}\n40.5,1,2,140,289,0,0,172,0,0.0,1,0\n");
        assert!(LabeledDataset::from_reader(fractional.as_bytes()).is_err());
    }

    #[test]
    fn test_rejects_missing_column_and_empty() {
        let no_target = "age,sex\n40,1\n";
        assert!(matches!(
            LabeledDataset::from_reader(no_target.as_bytes()),
            Err(RiskError::Csv(_))
        ));

        let header_only = SAMPLE_CSV.lines().next().unwrap();
        assert!(matches!(
            LabeledDataset::from_reader(header_only.as_bytes()),
            Err(RiskError::Dataset(_))
        ));
    }

    #[test]
    fn test_split_sizes_and_determinism() {
        let dataset = LabeledDataset::from_reader(SAMPLE_CSV.as_bytes()).unwrap();
        let (train, test) = dataset.split(0.2, 42).unwrap();
        assert_eq!(train.len(), 32);
        assert_eq!(test.len(), 8);

        let (train_again, test_again) = dataset.split(0.2, 42).unwrap();
        assert_eq!(train, train_again);
        assert_eq!(test, test_again);

        let (other_train, _) = dataset.split(0.2, 7).unwrap();
        assert_ne!(train, other_train);
    }

    #[test]
    fn test_split_rejects_bad_fraction() {
        let dataset = LabeledDataset::from_reader(SAMPLE_CSV.as_bytes()).unwrap();
        assert!(matches!(dataset.split(0.0, 42), Err(RiskError::Config(_))));
        assert!(matches!(dataset.split(1.0, 42), Err(RiskError::Config(_))));
    }

    #[test]
    fn test_categories_observed() {
        let dataset = LabeledDataset::from_reader(SAMPLE_CSV.as_bytes()).unwrap();
        let categories = dataset.categories();
        assert_eq!(
            categories[&Field::ChestPainType],
            BTreeSet::from([1, 2, 3, 4])
        );
        assert_eq!(categories[&Field::RestingEcg], BTreeSet::from([0, 1]));
        assert_eq!(categories[&Field::StSlope], BTreeSet::from([1, 2]));
    }
}
