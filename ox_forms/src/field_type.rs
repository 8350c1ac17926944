//! Closed sets of the field and column types a schema may declare.
//!
//! Type names are matched case-insensitively. A name outside the set keeps its
//! raw text in the `Other` arm and behaves as a plain text input.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
#[serde(from = "String", into = "String")]
pub enum FieldType {
    Heading,
    Accordion,
    EmptyDiv,
    SelectDropdown,
    Modal,
    ModalInput,
    Checkbox,
    RadioButton,
    DatePickerSingle,
    ClockPicker,
    ClockPickerCheckbox,
    ColorPicker,
    MultiSelectWithInputDiv,
    MultiSelectWithDropdownInputDiv,
    TextArea,
    InputField,
    Other(String),
}

impl Default for FieldType {
    fn default() -> Self {
        FieldType::Other(String::new())
    }
}

impl FieldType {
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "heading" => FieldType::Heading,
            "accordion" => FieldType::Accordion,
            "emptydiv" => FieldType::EmptyDiv,
            "selectdropdown" => FieldType::SelectDropdown,
            "modal" => FieldType::Modal,
            "modalinput" => FieldType::ModalInput,
            "checkbox" => FieldType::Checkbox,
            "radiobutton" => FieldType::RadioButton,
            "datepickersingle" => FieldType::DatePickerSingle,
            "clockpicker" => FieldType::ClockPicker,
            "clockpickercheckbox" => FieldType::ClockPickerCheckbox,
            "colorpicker" => FieldType::ColorPicker,
            "multiselectwithinputdiv" => FieldType::MultiSelectWithInputDiv,
            "multiselectwithdropdowninputdiv" => FieldType::MultiSelectWithDropdownInputDiv,
            "textarea" => FieldType::TextArea,
            "inputfield" => FieldType::InputField,
            _ => FieldType::Other(name.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            FieldType::Heading => "heading",
            FieldType::Accordion => "accordion",
            FieldType::EmptyDiv => "emptydiv",
            FieldType::SelectDropdown => "selectdropdown",
            FieldType::Modal => "modal",
            FieldType::ModalInput => "modalinput",
            FieldType::Checkbox => "checkbox",
            FieldType::RadioButton => "radiobutton",
            FieldType::DatePickerSingle => "datepickersingle",
            FieldType::ClockPicker => "clockpicker",
            FieldType::ClockPickerCheckbox => "clockpickercheckbox",
            FieldType::ColorPicker => "colorpicker",
            FieldType::MultiSelectWithInputDiv => "multiselectwithinputdiv",
            FieldType::MultiSelectWithDropdownInputDiv => "multiselectwithdropdowninputdiv",
            FieldType::TextArea => "textarea",
            FieldType::InputField => "inputfield",
            FieldType::Other(name) => name,
        }
    }

    /// Types whose value is an option record chosen from a list. These feed
    /// cascading updates.
    pub fn is_picker_like(&self) -> bool {
        matches!(self, FieldType::Modal | FieldType::ModalInput | FieldType::SelectDropdown)
    }

    /// Types that open a picker session rather than an inline list.
    pub fn opens_picker(&self) -> bool {
        matches!(self, FieldType::Modal | FieldType::ModalInput)
    }

    pub fn is_multi_entry(&self) -> bool {
        matches!(
            self,
            FieldType::MultiSelectWithInputDiv | FieldType::MultiSelectWithDropdownInputDiv
        )
    }
}

impl From<String> for FieldType {
    fn from(name: String) -> Self {
        FieldType::parse(&name)
    }
}

impl From<FieldType> for String {
    fn from(t: FieldType) -> Self {
        t.as_str().to_string()
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
#[serde(from = "String", into = "String")]
pub enum ColumnType {
    AutoIncrement,
    Display,
    Delete,
    Modal,
    ModalInput,
    SelectDropdown,
    InputField,
    ColorPicker,
    ClockPicker,
    DatePickerSingle,
    Other(String),
}

impl Default for ColumnType {
    fn default() -> Self {
        ColumnType::Other(String::new())
    }
}

impl ColumnType {
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "autoincrement" => ColumnType::AutoIncrement,
            "display" => ColumnType::Display,
            "delete" => ColumnType::Delete,
            "modal" => ColumnType::Modal,
            "modalinput" => ColumnType::ModalInput,
            "selectdropdown" => ColumnType::SelectDropdown,
            "inputfield" => ColumnType::InputField,
            "colorpicker" => ColumnType::ColorPicker,
            "clockpicker" => ColumnType::ClockPicker,
            "datepickersingle" => ColumnType::DatePickerSingle,
            _ => ColumnType::Other(name.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ColumnType::AutoIncrement => "AutoIncrement",
            ColumnType::Display => "Display",
            ColumnType::Delete => "Delete",
            ColumnType::Modal => "Modal",
            ColumnType::ModalInput => "ModalInput",
            ColumnType::SelectDropdown => "SelectDropdown",
            ColumnType::InputField => "InputField",
            ColumnType::ColorPicker => "ColorPicker",
            ColumnType::ClockPicker => "ClockPicker",
            ColumnType::DatePickerSingle => "DatePickerSingle",
            ColumnType::Other(name) => name,
        }
    }

    pub fn is_picker_like(&self) -> bool {
        matches!(self, ColumnType::Modal | ColumnType::ModalInput | ColumnType::SelectDropdown)
    }
}

impl From<String> for ColumnType {
    fn from(name: String) -> Self {
        ColumnType::parse(&name)
    }
}

impl From<ColumnType> for String {
    fn from(t: ColumnType) -> Self {
        t.as_str().to_string()
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_type_is_case_insensitive() {
        assert_eq!(FieldType::parse("ClockPicker"), FieldType::ClockPicker);
        assert_eq!(FieldType::parse("colorPicker"), FieldType::ColorPicker);
        assert_eq!(FieldType::parse("EmptyDiv"), FieldType::EmptyDiv);
    }

    #[test]
    fn test_unknown_type_is_kept() {
        let t: FieldType = serde_json::from_str("\"sliderinput\"").unwrap();
        assert_eq!(t, FieldType::Other("sliderinput".to_string()));
        assert_eq!(serde_json::to_string(&t).unwrap(), "\"sliderinput\"");
    }

    #[test]
    fn test_column_type_round_names() {
        assert_eq!(ColumnType::parse("Display"), ColumnType::Display);
        assert_eq!(ColumnType::parse("autoincrement"), ColumnType::AutoIncrement);
        assert!(ColumnType::parse("ModalInput").is_picker_like());
        assert!(!ColumnType::parse("InputField").is_picker_like());
    }
}
