//! Pixel matrix: layout, pixel keys and pixel groups.
//!
//! A matrix is a 3-D arrangement of pixel keys (z → y → x, with `None`
//! entries for explicit spacing gaps), either generated from a pixel
//! count triple or given explicitly. Pixel groups name ordered subsets of
//! those keys, selected by explicit list, numeric coordinate constraints,
//! name patterns, or the literal "all".

use indexmap::IndexMap;
use regex::Regex;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use super::error::ModelError;

// ============================================================================
// LAYOUT & AXES
// ============================================================================

/// Shape classification of a matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MatrixLayout {
    /// Generated, one axis > 1.
    Line,
    /// Generated, two axes > 1.
    Rect,
    /// Generated, all three axes > 1.
    Cube,
    /// Explicit pixel keys, single z-level.
    Custom2D,
    /// Explicit pixel keys, multiple z-levels.
    Custom3D,
}

/// One of the three matrix axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
}

/// 1-based pixel position.
pub type PixelPosition = (u32, u32, u32);

fn axis_of(position: PixelPosition, axis: Axis) -> u32 {
    match axis {
        Axis::X => position.0,
        Axis::Y => position.1,
        Axis::Z => position.2,
    }
}

// ============================================================================
// PIXEL GROUP SPECS
// ============================================================================

/// A numeric constraint on one axis coordinate.
///
/// String forms: `=5`, `<5`, `>5`, `<=5`, `>=5`, `even`, `odd`, `3n`,
/// `3n+1`. A bare number means equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisConstraint {
    Eq(u32),
    Lt(u32),
    Gt(u32),
    Le(u32),
    Ge(u32),
    Even,
    Odd,
    /// Every `step`-th coordinate, offset by `offset` (the `3n+1` form).
    Step { step: u32, offset: u32 },
}

impl AxisConstraint {
    /// Parse one constraint string.
    pub fn parse(input: &str) -> Result<Self, ModelError> {
        let invalid = |message: &str| ModelError::InvalidConstraint {
            constraint: input.to_string(),
            message: message.to_string(),
        };

        let trimmed = input.trim();
        match trimmed {
            "even" => return Ok(Self::Even),
            "odd" => return Ok(Self::Odd),
            _ => {}
        }

        // The `3n` / `3n+1` step forms.
        if let Some(n_pos) = trimmed.find('n') {
            let step: u32 = trimmed[..n_pos]
                .parse()
                .map_err(|_| invalid("bad step factor"))?;
            if step == 0 {
                return Err(invalid("step factor must be positive"));
            }
            let rest = &trimmed[n_pos + 1..];
            let offset = if rest.is_empty() {
                0
            } else {
                let rest = rest
                    .strip_prefix('+')
                    .ok_or_else(|| invalid("expected `+` after `n`"))?;
                rest.parse().map_err(|_| invalid("bad step offset"))?
            };
            return Ok(Self::Step { step, offset });
        }

        let (op, number) = if let Some(rest) = trimmed.strip_prefix("<=") {
            ("<=", rest)
        } else if let Some(rest) = trimmed.strip_prefix(">=") {
            (">=", rest)
        } else if let Some(rest) = trimmed.strip_prefix('<') {
            ("<", rest)
        } else if let Some(rest) = trimmed.strip_prefix('>') {
            (">", rest)
        } else if let Some(rest) = trimmed.strip_prefix('=') {
            ("=", rest)
        } else {
            ("=", trimmed)
        };

        let value: u32 = number.trim().parse().map_err(|_| invalid("bad number"))?;
        Ok(match op {
            "<=" => Self::Le(value),
            ">=" => Self::Ge(value),
            "<" => Self::Lt(value),
            ">" => Self::Gt(value),
            _ => Self::Eq(value),
        })
    }

    pub fn matches(&self, coordinate: u32) -> bool {
        match *self {
            Self::Eq(n) => coordinate == n,
            Self::Lt(n) => coordinate < n,
            Self::Gt(n) => coordinate > n,
            Self::Le(n) => coordinate <= n,
            Self::Ge(n) => coordinate >= n,
            Self::Even => coordinate % 2 == 0,
            Self::Odd => coordinate % 2 == 1,
            Self::Step { step, offset } => coordinate % step == offset % step,
        }
    }
}

/// How a pixel group selects its members.
#[derive(Debug, Clone, PartialEq)]
pub enum PixelGroupSpec {
    /// Every pixel key, in default order.
    All,
    /// An explicit ordered member list, used verbatim.
    Keys(Vec<SmolStr>),
    /// Coordinate and name-pattern constraints; members are collected in
    /// default pixel order.
    Constraints {
        x: Vec<AxisConstraint>,
        y: Vec<AxisConstraint>,
        z: Vec<AxisConstraint>,
        /// Regex patterns matched against the whole pixel key.
        name: Vec<String>,
    },
}

// ============================================================================
// MATRIX
// ============================================================================

/// A fixture's pixel matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    /// Pixel keys by z-level, row, column. `None` is a spacing gap.
    structure: Vec<Vec<Vec<Option<SmolStr>>>>,
    layout: MatrixLayout,
    /// Group key → resolved ordered member pixel keys.
    pixel_groups: IndexMap<SmolStr, Vec<SmolStr>>,
}

impl Matrix {
    /// Generate a matrix from a pixel count per axis.
    ///
    /// Keys are plain `"1"`..`"n"` when only one axis has more than one
    /// pixel, `"(x, y, z)"` (1-based) otherwise.
    pub fn from_pixel_count(x_count: u32, y_count: u32, z_count: u32) -> Self {
        let flat = [x_count, y_count, z_count]
            .iter()
            .filter(|&&count| count > 1)
            .count()
            <= 1;

        let mut structure = Vec::with_capacity(z_count as usize);
        let mut flat_index = 0u32;
        for z in 1..=z_count {
            let mut level = Vec::with_capacity(y_count as usize);
            for y in 1..=y_count {
                let mut row = Vec::with_capacity(x_count as usize);
                for x in 1..=x_count {
                    flat_index += 1;
                    let key = if flat {
                        SmolStr::new(flat_index.to_string())
                    } else {
                        SmolStr::new(format!("({x}, {y}, {z})"))
                    };
                    row.push(Some(key));
                }
                level.push(row);
            }
            structure.push(level);
        }

        let axes_over_one = [x_count, y_count, z_count]
            .iter()
            .filter(|&&count| count > 1)
            .count();
        let layout = match axes_over_one {
            0 | 1 => MatrixLayout::Line,
            2 => MatrixLayout::Rect,
            _ => MatrixLayout::Cube,
        };

        Self {
            structure,
            layout,
            pixel_groups: IndexMap::new(),
        }
    }

    /// Build a matrix from explicit pixel keys (z → y → x, `None` = gap).
    pub fn from_pixel_keys(structure: Vec<Vec<Vec<Option<SmolStr>>>>) -> Self {
        let layout = if structure.len() > 1 {
            MatrixLayout::Custom3D
        } else {
            MatrixLayout::Custom2D
        };
        Self {
            structure,
            layout,
            pixel_groups: IndexMap::new(),
        }
    }

    pub fn layout(&self) -> MatrixLayout {
        self.layout
    }

    /// All pixel keys in default order: z, then y, then x ascending,
    /// gaps skipped.
    pub fn pixel_keys(&self) -> Vec<SmolStr> {
        self.structure
            .iter()
            .flatten()
            .flatten()
            .flatten()
            .cloned()
            .collect()
    }

    /// Pixel key → 1-based (x, y, z) position.
    pub fn pixel_key_positions(&self) -> FxHashMap<SmolStr, PixelPosition> {
        let mut positions = FxHashMap::default();
        for (z, level) in self.structure.iter().enumerate() {
            for (y, row) in level.iter().enumerate() {
                for (x, slot) in row.iter().enumerate() {
                    if let Some(key) = slot {
                        positions
                            .insert(key.clone(), (x as u32 + 1, y as u32 + 1, z as u32 + 1));
                    }
                }
            }
        }
        positions
    }

    /// Pixel keys ordered so `first` varies fastest and `third` slowest.
    pub fn pixel_keys_by_order(&self, first: Axis, second: Axis, third: Axis) -> Vec<SmolStr> {
        let positions = self.pixel_key_positions();
        let mut keys = self.pixel_keys();
        keys.sort_by_key(|key| {
            let position = positions[key];
            (
                axis_of(position, third),
                axis_of(position, second),
                axis_of(position, first),
            )
        });
        keys
    }

    pub fn has_pixel_key(&self, key: &str) -> bool {
        self.structure
            .iter()
            .flatten()
            .flatten()
            .flatten()
            .any(|pixel| pixel == key)
    }

    /// Group keys in declaration order.
    pub fn pixel_group_keys(&self) -> Vec<SmolStr> {
        self.pixel_groups.keys().cloned().collect()
    }

    pub fn pixel_group(&self, key: &str) -> Option<&[SmolStr]> {
        self.pixel_groups.get(key).map(Vec::as_slice)
    }

    /// True for pixel keys and pixel-group keys alike.
    pub fn has_key(&self, key: &str) -> bool {
        self.has_pixel_key(key) || self.pixel_groups.contains_key(key)
    }

    /// Resolve and add a pixel group. Members of `Keys` specs must exist.
    pub fn add_pixel_group(
        &mut self,
        key: impl Into<SmolStr>,
        spec: PixelGroupSpec,
    ) -> Result<(), ModelError> {
        let members = self.resolve_group_spec(&spec)?;
        self.pixel_groups.insert(key.into(), members);
        Ok(())
    }

    fn resolve_group_spec(&self, spec: &PixelGroupSpec) -> Result<Vec<SmolStr>, ModelError> {
        match spec {
            PixelGroupSpec::All => Ok(self.pixel_keys()),
            PixelGroupSpec::Keys(keys) => {
                for key in keys {
                    if !self.has_pixel_key(key) {
                        return Err(ModelError::UnknownPixelKey {
                            pixel_key: key.clone(),
                        });
                    }
                }
                Ok(keys.clone())
            }
            PixelGroupSpec::Constraints { x, y, z, name } => {
                let patterns: Vec<Regex> = name
                    .iter()
                    .map(|pattern| {
                        Regex::new(pattern).map_err(|e| ModelError::InvalidConstraint {
                            constraint: pattern.clone(),
                            message: e.to_string(),
                        })
                    })
                    .collect::<Result<_, _>>()?;

                let positions = self.pixel_key_positions();
                Ok(self
                    .pixel_keys()
                    .into_iter()
                    .filter(|key| {
                        let position = positions[key];
                        x.iter().all(|c| c.matches(position.0))
                            && y.iter().all(|c| c.matches(position.1))
                            && z.iter().all(|c| c.matches(position.2))
                            && patterns.iter().all(|p| p.is_match(key))
                    })
                    .collect())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_matrix_uses_flat_keys() {
        let matrix = Matrix::from_pixel_count(5, 1, 1);
        assert_eq!(matrix.layout(), MatrixLayout::Line);
        assert_eq!(
            matrix.pixel_keys(),
            vec!["1", "2", "3", "4", "5"]
        );
    }

    #[test]
    fn test_rect_matrix_uses_coordinate_keys() {
        let matrix = Matrix::from_pixel_count(2, 2, 1);
        assert_eq!(matrix.layout(), MatrixLayout::Rect);
        assert_eq!(
            matrix.pixel_keys(),
            vec!["(1, 1, 1)", "(2, 1, 1)", "(1, 2, 1)", "(2, 2, 1)"]
        );
    }

    #[test]
    fn test_cube_layout() {
        let matrix = Matrix::from_pixel_count(2, 2, 2);
        assert_eq!(matrix.layout(), MatrixLayout::Cube);
        assert_eq!(matrix.pixel_keys().len(), 8);
    }

    #[test]
    fn test_explicit_keys_with_gaps() {
        let matrix = Matrix::from_pixel_keys(vec![vec![
            vec![Some(SmolStr::new("A")), None, Some(SmolStr::new("B"))],
            vec![None, Some(SmolStr::new("C")), None],
        ]]);
        assert_eq!(matrix.layout(), MatrixLayout::Custom2D);
        assert_eq!(matrix.pixel_keys(), vec!["A", "B", "C"]);
        assert!(matrix.has_pixel_key("C"));
        assert!(!matrix.has_pixel_key("D"));
    }

    #[test]
    fn test_positions_skip_gaps() {
        let matrix = Matrix::from_pixel_keys(vec![vec![
            vec![Some(SmolStr::new("A")), None, Some(SmolStr::new("B"))],
        ]]);
        let positions = matrix.pixel_key_positions();
        assert_eq!(positions[&SmolStr::new("A")], (1, 1, 1));
        assert_eq!(positions[&SmolStr::new("B")], (3, 1, 1));
    }

    #[test]
    fn test_pixel_keys_by_order() {
        let matrix = Matrix::from_pixel_count(2, 2, 1);
        // Y varies fastest: walk columns top to bottom, left to right.
        assert_eq!(
            matrix.pixel_keys_by_order(Axis::Y, Axis::X, Axis::Z),
            vec!["(1, 1, 1)", "(1, 2, 1)", "(2, 1, 1)", "(2, 2, 1)"]
        );
    }

    #[test]
    fn test_constraint_parsing() {
        assert_eq!(AxisConstraint::parse("=5").unwrap(), AxisConstraint::Eq(5));
        assert_eq!(AxisConstraint::parse("5").unwrap(), AxisConstraint::Eq(5));
        assert_eq!(AxisConstraint::parse("<=3").unwrap(), AxisConstraint::Le(3));
        assert_eq!(AxisConstraint::parse(">2").unwrap(), AxisConstraint::Gt(2));
        assert_eq!(AxisConstraint::parse("even").unwrap(), AxisConstraint::Even);
        assert_eq!(
            AxisConstraint::parse("3n+1").unwrap(),
            AxisConstraint::Step { step: 3, offset: 1 }
        );
        assert!(AxisConstraint::parse("banana").is_err());
    }

    #[test]
    fn test_constraint_matching() {
        assert!(AxisConstraint::Step { step: 3, offset: 1 }.matches(4));
        assert!(!AxisConstraint::Step { step: 3, offset: 1 }.matches(3));
        assert!(AxisConstraint::Odd.matches(3));
        assert!(AxisConstraint::Even.matches(4));
    }

    #[test]
    fn test_group_all_and_keys() {
        let mut matrix = Matrix::from_pixel_count(3, 1, 1);
        matrix.add_pixel_group("All", PixelGroupSpec::All).unwrap();
        matrix
            .add_pixel_group(
                "Odd",
                PixelGroupSpec::Keys(vec![SmolStr::new("1"), SmolStr::new("3")]),
            )
            .unwrap();

        assert_eq!(matrix.pixel_group("All").unwrap(), &["1", "2", "3"]);
        assert_eq!(matrix.pixel_group("Odd").unwrap(), &["1", "3"]);
        assert_eq!(matrix.pixel_group_keys(), vec!["All", "Odd"]);
        assert!(matrix.has_key("Odd"));
    }

    #[test]
    fn test_group_keys_must_exist() {
        let mut matrix = Matrix::from_pixel_count(2, 1, 1);
        let result = matrix.add_pixel_group(
            "Bad",
            PixelGroupSpec::Keys(vec![SmolStr::new("7")]),
        );
        assert!(matches!(result, Err(ModelError::UnknownPixelKey { .. })));
    }

    #[test]
    fn test_group_constraints() {
        let mut matrix = Matrix::from_pixel_count(4, 2, 1);
        matrix
            .add_pixel_group(
                "Top odd",
                PixelGroupSpec::Constraints {
                    x: vec![AxisConstraint::Odd],
                    y: vec![AxisConstraint::Eq(1)],
                    z: vec![],
                    name: vec![],
                },
            )
            .unwrap();
        assert_eq!(
            matrix.pixel_group("Top odd").unwrap(),
            &["(1, 1, 1)", "(3, 1, 1)"]
        );
    }

    #[test]
    fn test_group_name_patterns() {
        let matrix_keys = vec![vec![vec![
            Some(SmolStr::new("Left 1")),
            Some(SmolStr::new("Right 1")),
            Some(SmolStr::new("Left 2")),
        ]]];
        let mut matrix = Matrix::from_pixel_keys(matrix_keys);
        matrix
            .add_pixel_group(
                "Lefts",
                PixelGroupSpec::Constraints {
                    x: vec![],
                    y: vec![],
                    z: vec![],
                    name: vec!["^Left".to_string()],
                },
            )
            .unwrap();
        assert_eq!(matrix.pixel_group("Lefts").unwrap(), &["Left 1", "Left 2"]);
    }
}
