use crate::Point3;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Invalid input reported by the kernel.
///
/// _Not found_ results are never errors, those queries return `Option`.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum Error {
    // Points.
    #[error("coordinate buffer of length {0} is not a multiple of 3")]
    MalformedCoordinates(usize),
    #[error("point id {id} is out of range for {len} points")]
    PointIdOutOfRange { id: usize, len: usize },
    #[error("point id {0} is already inserted")]
    PointAlreadyInserted(usize),
    // Cells.
    #[error("malformed cell array: cell at {offset} declares {size} ids, {remaining} remain")]
    MalformedCellArray {
        offset: usize,
        size: usize,
        remaining: usize,
    },
    #[error("cell id {id} is out of range for {len} cells")]
    CellIdOutOfRange { id: usize, len: usize },
    #[error("cells have not been built, call build_cells first")]
    CellsNotBuilt,
    #[error("links have not been built, call build_links first")]
    LinksNotBuilt,
    // Structured.
    #[error("an extent requires 6 values, found {0}")]
    MalformedExtent(usize),
    // Locators.
    #[error("locator has not been initialised for point insertion")]
    LocatorNotInitialized,
    #[error("point {0:?} lies outside the locator bounds")]
    PointOutsideBounds(Point3),
    #[error("bounds are invalid (min > max on some axis)")]
    InvalidBounds,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages() {
        let e = Error::MalformedCellArray {
            offset: 4,
            size: 3,
            remaining: 1,
        };
        assert_eq!(e.to_string(), "malformed cell array: cell at 4 declares 3 ids, 1 remain");
        assert_eq!(
            Error::MalformedExtent(5).to_string(),
            "an extent requires 6 values, found 5"
        );
    }
}
