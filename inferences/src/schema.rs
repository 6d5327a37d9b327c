use serde::{Deserialize, Serialize};

/// Number of columns the classifier is trained on.
pub const N_FEATURES: usize = 7;

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AnimalType {
    Cat,
    Dog,
    /// Also stands in for "nothing selected yet".
    #[default]
    Other,
}

impl AnimalType {
    pub const ALL: [AnimalType; 3] = [AnimalType::Cat, AnimalType::Dog, AnimalType::Other];

    pub fn as_str(self) -> &'static str {
        match self {
            AnimalType::Cat => "Cat",
            AnimalType::Dog => "Dog",
            AnimalType::Other => "Other",
        }
    }
}

/// Raw answers from one form submission.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(default)]
pub struct AnimalDescriptor {
    pub animal_type: AnimalType,
    pub color_black: bool,
    pub female: bool,
    pub younger_than_one_year: bool,
    pub fixed: bool,
    pub abnormal_intake_condition: bool,
}

/// One encoded row, serialized with the column names the model was trained on.
///
/// Field order is the positional order of the model input.
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
pub struct FeatureRow {
    #[serde(rename = "Color_black")]
    pub color_black: bool,
    #[serde(rename = "Fixed")]
    pub fixed: bool,
    #[serde(rename = "Type_Cat")]
    pub type_cat: bool,
    #[serde(rename = "Type_Dog")]
    pub type_dog: bool,
    #[serde(rename = "Intake Condition_Not Normal")]
    pub intake_not_normal: bool,
    #[serde(rename = "Female")]
    pub female: bool,
    #[serde(rename = "Young")]
    pub young: bool,
}

impl FeatureRow {
    pub const COLUMNS: [&'static str; N_FEATURES] = [
        "Color_black",
        "Fixed",
        "Type_Cat",
        "Type_Dog",
        "Intake Condition_Not Normal",
        "Female",
        "Young",
    ];

    pub fn values(&self) -> [bool; N_FEATURES] {
        [
            self.color_black,
            self.fixed,
            self.type_cat,
            self.type_dog,
            self.intake_not_normal,
            self.female,
            self.young,
        ]
    }

    /// Positional model input, `1.0` for true and `0.0` for false.
    pub fn to_array(&self) -> [f32; N_FEATURES] {
        self.values().map(|v| if v { 1.0 } else { 0.0 })
    }

    /// Looks a column up by its trained name.
    pub fn get(&self, column: &str) -> Option<bool> {
        Self::COLUMNS
            .iter()
            .position(|c| *c == column)
            .map(|i| self.values()[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, bool)> {
        Self::COLUMNS.into_iter().zip(self.values())
    }
}

/// Maps a descriptor onto the fixed feature schema.
///
/// Every combination is accepted; `Other` leaves both type columns false.
pub fn encode(descriptor: &AnimalDescriptor) -> FeatureRow {
    FeatureRow {
        color_black: descriptor.color_black,
        fixed: descriptor.fixed,
        type_cat: descriptor.animal_type == AnimalType::Cat,
        type_dog: descriptor.animal_type == AnimalType::Dog,
        intake_not_normal: descriptor.abnormal_intake_condition,
        female: descriptor.female,
        young: descriptor.younger_than_one_year,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_descriptors() -> Vec<AnimalDescriptor> {
        let mut out = Vec::new();
        for animal_type in AnimalType::ALL {
            for bits in 0u8..32 {
                out.push(AnimalDescriptor {
                    animal_type,
                    color_black: bits & 1 != 0,
                    female: bits & 2 != 0,
                    younger_than_one_year: bits & 4 != 0,
                    fixed: bits & 8 != 0,
                    abnormal_intake_condition: bits & 16 != 0,
                });
            }
        }
        out
    }

    #[test]
    fn black_fixed_female_cat() {
        let descriptor = AnimalDescriptor {
            animal_type: AnimalType::Cat,
            color_black: true,
            female: true,
            younger_than_one_year: false,
            fixed: true,
            abnormal_intake_condition: false,
        };
        let row = encode(&descriptor);
        assert_eq!(
            row,
            FeatureRow {
                color_black: true,
                fixed: true,
                type_cat: true,
                type_dog: false,
                intake_not_normal: false,
                female: true,
                young: false,
            }
        );
        assert_eq!(row.to_array(), [1.0, 1.0, 1.0, 0.0, 0.0, 1.0, 0.0]);
    }

    #[test]
    fn type_columns_are_exclusive() {
        for descriptor in all_descriptors() {
            let row = encode(&descriptor);
            match descriptor.animal_type {
                AnimalType::Cat => assert!(row.type_cat && !row.type_dog),
                AnimalType::Dog => assert!(!row.type_cat && row.type_dog),
                AnimalType::Other => assert!(!row.type_cat && !row.type_dog),
            }
        }
    }

    #[test]
    fn encoding_is_deterministic() {
        for descriptor in all_descriptors() {
            assert_eq!(encode(&descriptor), encode(&descriptor));
        }
    }

    #[test]
    fn flags_pass_through_by_name() {
        for descriptor in all_descriptors() {
            let row = encode(&descriptor);
            assert_eq!(row.get("Color_black"), Some(descriptor.color_black));
            assert_eq!(row.get("Fixed"), Some(descriptor.fixed));
            assert_eq!(
                row.get("Intake Condition_Not Normal"),
                Some(descriptor.abnormal_intake_condition)
            );
            assert_eq!(row.get("Female"), Some(descriptor.female));
            assert_eq!(row.get("Young"), Some(descriptor.younger_than_one_year));
        }
        assert_eq!(encode(&AnimalDescriptor::default()).get("Type_Horse"), None);
    }

    #[test]
    fn default_descriptor_is_other() {
        let descriptor = AnimalDescriptor::default();
        assert_eq!(descriptor.animal_type, AnimalType::Other);
        assert!(encode(&descriptor).values().iter().all(|v| !v));
    }

    #[test]
    fn serializes_in_column_order() {
        let row = encode(&AnimalDescriptor {
            animal_type: AnimalType::Dog,
            ..Default::default()
        });
        let json = serde_json::to_string(&row).unwrap();
        let mut last = 0;
        for column in FeatureRow::COLUMNS {
            let at = json.find(&format!("\"{column}\"")).unwrap();
            assert!(at >= last, "{column} out of order in {json}");
            last = at;
        }
        let names: Vec<_> = row.iter().map(|(name, _)| name).collect();
        assert_eq!(names, FeatureRow::COLUMNS);
    }

    #[test]
    fn descriptor_json_fills_missing_fields() {
        let descriptor: AnimalDescriptor =
            serde_json::from_str(r#"{"animal_type":"Dog","female":true}"#).unwrap();
        assert_eq!(descriptor.animal_type, AnimalType::Dog);
        assert!(descriptor.female);
        assert!(!descriptor.fixed);
    }
}
