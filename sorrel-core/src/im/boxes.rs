// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use serde_json::Value;

use crate::constant::BOUNDING_BOX_JSON_VALID_KEYS;
use crate::error::SorrelError;

/// A bounding box container for storing locations of annotated objects
///
/// The bounding boxes are stored in xyxy format. Any input set of
/// bounding boxes that has a box with a negative width or height will
/// return an error.
///
/// # Examples
///
/// ```
/// use sorrel_core::im::BoundingBoxes;
///
/// let data: Vec<[f32; 4]> = vec![[0., 0., 1., 1.], [3., 4., 5., 7.]];
/// let boxes = BoundingBoxes::new(data);
/// assert!(boxes.is_ok());
///
/// let data: Vec<[f32; 4]> = vec![[2., 2., 1., 1.], [3., 4., 5., 7.]];
/// let boxes = BoundingBoxes::new(data);
/// assert!(boxes.is_err());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoundingBoxes {
    data: Vec<[f32; 4]>,
}

impl BoundingBoxes {
    /// Initialize a new bounding boxes container
    ///
    /// # Arguments
    ///
    /// * `data` - Bounding boxes in xyxy format
    pub fn new(data: Vec<[f32; 4]>) -> Result<Self, SorrelError> {
        let valid = data
            .iter()
            .all(|[min_x, min_y, max_x, max_y]| max_x >= min_x && max_y >= min_y);

        if !valid {
            return Err(SorrelError::BoxesSizeError);
        }

        Ok(Self { data })
    }

    /// Initialize bounding boxes from xywh (COCO) formatted boxes
    ///
    /// ```
    /// use sorrel_core::im::BoundingBoxes;
    ///
    /// let boxes = BoundingBoxes::from_xywh(vec![[1., 2., 3., 4.]]).unwrap();
    /// assert_eq!(boxes.as_xyxy(), &vec![[1., 2., 4., 6.]]);
    /// ```
    pub fn from_xywh(data: Vec<[f32; 4]>) -> Result<Self, SorrelError> {
        Self::new(
            data.into_iter()
                .map(|[x, y, w, h]| [x, y, x + w, y + h])
                .collect(),
        )
    }

    /// Parse bounding boxes from the first valid key of a json object
    ///
    /// Returns `Ok(None)` if the object has none of the accepted keys.
    pub fn from_json_value(data: &Value) -> Result<Option<Self>, SorrelError> {
        for key in &BOUNDING_BOX_JSON_VALID_KEYS {
            if let Some(boxes) = data.get(key).and_then(|v| v.as_array()) {
                let boxes = boxes
                    .iter()
                    .map(|item| {
                        let b = item.as_array().ok_or(SorrelError::BoxesReadError)?;
                        if b.len() != 4 {
                            return Err(SorrelError::BoxesReadError);
                        }

                        Ok([
                            to_f32(&b[0])?,
                            to_f32(&b[1])?,
                            to_f32(&b[2])?,
                            to_f32(&b[3])?,
                        ])
                    })
                    .collect::<Result<Vec<[f32; 4]>, SorrelError>>()?;

                return Self::new(boxes).map(Some);
            }
        }

        Ok(None)
    }
}

// >>> PROPERTY METHODS

impl BoundingBoxes {
    /// Number of bounding boxes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if bounding boxes are empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

// <<< PROPERTY METHODS

// >>> CONVERSION METHODS

impl BoundingBoxes {
    /// Return a reference to underlying bounding boxes data
    pub fn as_xyxy(&self) -> &Vec<[f32; 4]> {
        &self.data
    }
}

// <<< CONVERSION METHODS

pub(crate) fn to_f32(value: &Value) -> Result<f32, SorrelError> {
    value
        .as_f64()
        .map(|n| n as f32)
        .ok_or(SorrelError::BoxesReadError)
}
