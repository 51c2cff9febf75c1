use std::fmt;

/// One row of the colour attribute table of a thematic raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassEntry {
  pub code: u8,
  pub name: &'static str,
  pub rgba: [u8; 4],
}

// Classification codes written to the output raster.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LandClass {
  Undefined = 0,
  Water = 1,
  Bare = 2,
  Woody = 3,
  Herbaceous = 4,
  Cloud = 5,
  PrimBare = 6,
  Snow = 7,
  Glacial = 8, // glacial lakes, wet rock, water with high sediment
  Land = 9,
}

impl LandClass {
  pub const ALL: [LandClass; 10] = [
    LandClass::Undefined,
    LandClass::Water,
    LandClass::Bare,
    LandClass::Woody,
    LandClass::Herbaceous,
    LandClass::Cloud,
    LandClass::PrimBare,
    LandClass::Snow,
    LandClass::Glacial,
    LandClass::Land,
  ];

  pub fn code(self) -> u8 {
    self as u8
  }

  pub fn from_code(code: u8) -> Option<LandClass> {
    LandClass::ALL.get(code as usize).copied()
  }

  // Name stored in the "Class" column of the attribute table
  pub fn name(self) -> &'static str {
    match self {
      LandClass::Undefined => "Undefined",
      LandClass::Water => "Water",
      LandClass::Bare => "Bare Ground",
      LandClass::Woody => "Woody",
      LandClass::Herbaceous => "Herbaceous",
      LandClass::Cloud => "Cloud",
      LandClass::PrimBare => "Primarily Bare Ground",
      LandClass::Snow => "Snow",
      LandClass::Glacial => "Glacial Lakes, Wet Rock, Water/Sediment",
      LandClass::Land => "Other Land",
    }
  }

  // Display colour as (red, green, blue, alpha)
  pub fn rgba(self) -> [u8; 4] {
    match self {
      LandClass::Undefined => [0, 0, 0, 255],
      LandClass::Water => [43, 148, 190, 255],
      LandClass::Bare => [211, 211, 211, 255],
      LandClass::Woody => [0, 100, 0, 255],
      LandClass::Herbaceous => [246, 249, 158, 255],
      LandClass::Cloud => [255, 0, 0, 255],
      LandClass::PrimBare => [209, 179, 140, 255],
      LandClass::Snow => [255, 0, 255, 255],
      LandClass::Glacial => [90, 178, 255, 255],
      LandClass::Land => [170, 170, 170, 255],
    }
  }

  pub fn entry(self) -> ClassEntry {
    ClassEntry { code: self.code(), name: self.name(), rgba: self.rgba() }
  }

  pub fn legend() -> Vec<ClassEntry> {
    LandClass::ALL.iter().map(|class| class.entry()).collect()
  }
}

impl fmt::Display for LandClass {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.name())
  }
}
