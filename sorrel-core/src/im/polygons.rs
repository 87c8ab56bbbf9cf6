// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use serde_json::Value;

use crate::constant::POLYGON_JSON_VALID_KEYS;
use crate::error::SorrelError;
use crate::im::boxes::BoundingBoxes;

/// A polygon container for storing object outlines
///
/// The polygons are stored in (N, K, 2) format where N is the
/// number of polygons for a given image, K specifies the number
/// of points in each polygon, and 2 is xy. The polygons can be
/// ragged so K can vary for each polygon.
///
/// # Examples
///
/// ```
/// use sorrel_core::im::Polygons;
///
/// let data: Vec<Vec<[f32; 2]>> = vec![
///     vec![[0., 1.], [1., 1.], [1., 2.], [0., 2.]],
///     vec![[1., 1.], [2., 1.], [2., 2.], [1., 2.]],
/// ];
///
/// let polygons = Polygons::new(data);
/// assert!(polygons.is_ok());
///
/// let data: Vec<Vec<[f32; 2]>> = vec![
///     vec![[0., 1.], [1., 1.]],
///     vec![[1., 1.], [2., 1.]],
/// ];
///
/// let polygons = Polygons::new(data);
/// assert!(polygons.is_err());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Polygons {
    data: Vec<Vec<[f32; 2]>>,
}

impl Polygons {
    /// Initialize a new polygons container
    ///
    /// # Arguments
    ///
    /// * `data` - Polygons in (N, K, 2) format
    pub fn new(data: Vec<Vec<[f32; 2]>>) -> Result<Self, SorrelError> {
        if data.iter().any(|polygon| polygon.len() < 3) {
            return Err(SorrelError::PolygonsSizeError);
        }

        Ok(Self { data })
    }

    /// Initialize polygons from flat `[x0, y0, x1, y1, ...]` coordinate lists
    ///
    /// ```
    /// use sorrel_core::im::Polygons;
    ///
    /// let polygons = Polygons::from_flat(&[vec![0., 0., 4., 0., 4., 4.]]).unwrap();
    /// assert_eq!(polygons.as_points()[0], vec![[0., 0.], [4., 0.], [4., 4.]]);
    /// ```
    pub fn from_flat(data: &[Vec<f32>]) -> Result<Self, SorrelError> {
        if data.iter().any(|coords| coords.len() % 2 != 0) {
            return Err(SorrelError::PolygonsReadError);
        }

        Self::new(
            data.iter()
                .map(|coords| coords.chunks_exact(2).map(|xy| [xy[0], xy[1]]).collect())
                .collect(),
        )
    }

    /// Parse polygons from the first valid key of a json object
    ///
    /// Returns `Ok(None)` if the object has none of the accepted keys.
    pub fn from_json_value(data: &Value) -> Result<Option<Self>, SorrelError> {
        for key in &POLYGON_JSON_VALID_KEYS {
            if let Some(polygons) = data.get(key).and_then(|v| v.as_array()) {
                let polygons = polygons
                    .iter()
                    .map(|polygon| {
                        polygon
                            .as_array()
                            .ok_or(SorrelError::PolygonsReadError)?
                            .iter()
                            .map(|p| match p.as_array() {
                                Some(p) if p.len() == 2 => {
                                    let x = p[0].as_f64().ok_or(SorrelError::PolygonsReadError)?;
                                    let y = p[1].as_f64().ok_or(SorrelError::PolygonsReadError)?;
                                    Ok([x as f32, y as f32])
                                }
                                _ => Err(SorrelError::PolygonsReadError),
                            })
                            .collect::<Result<Vec<[f32; 2]>, SorrelError>>()
                    })
                    .collect::<Result<Vec<Vec<[f32; 2]>>, SorrelError>>()?;

                return Self::new(polygons).map(Some);
            }
        }

        Ok(None)
    }
}

// >>> PROPERTY METHODS

impl Polygons {
    /// Return the number of stored polygons
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if polygon has no data
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

// <<< PROPERTY METHODS

// >>> CONVERSION METHODS

impl Polygons {
    /// Return a reference to the underlying polygon points
    pub fn as_points(&self) -> &Vec<Vec<[f32; 2]>> {
        &self.data
    }

    /// Convert the polygons to bounding boxes
    ///
    /// ```
    /// use sorrel_core::im::Polygons;
    ///
    /// let polygons = Polygons::new(vec![vec![[1., 5.], [4., 2.], [3., 7.]]]).unwrap();
    /// let boxes = polygons.to_bounding_boxes().unwrap();
    /// assert_eq!(boxes.as_xyxy(), &vec![[1., 2., 4., 7.]]);
    /// ```
    pub fn to_bounding_boxes(&self) -> Result<BoundingBoxes, SorrelError> {
        BoundingBoxes::new(
            self.data
                .iter()
                .map(|polygon| {
                    let &[fx, fy] = &polygon[0];

                    let mut min_x = fx;
                    let mut min_y = fy;
                    let mut max_x = fx;
                    let mut max_y = fy;

                    for &[x, y] in polygon {
                        min_x = min_x.min(x);
                        min_y = min_y.min(y);
                        max_x = max_x.max(x);
                        max_y = max_y.max(y);
                    }

                    [min_x, min_y, max_x, max_y]
                })
                .collect::<Vec<[f32; 4]>>(),
        )
    }
}

// <<< CONVERSION METHODS
