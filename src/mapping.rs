//! Common interface of everything that maps an input vector to an output.

use std::io::{self, Write};

use crate::trees::forest::{RbfForest, RegressionForest};
use crate::trees::leaf_data::LeafDataFactory;
use crate::trees::tree::Tree;

/// An input to output function learned from data.
pub trait Mapping {
    type Output;

    fn get_output_value(&self, input: &[f64]) -> Self::Output;

    /// Writes a short plain-text description of the model.
    fn save_ascii(&self, writer: &mut dyn Write) -> io::Result<()>;
}

/// A single tree maps an input to a copy of its leaf payload.
impl<S, F> Mapping for Tree<S, F>
where
    F: LeafDataFactory,
    F::Data: Clone,
{
    type Output = F::Data;

    fn get_output_value(&self, input: &[f64]) -> F::Data {
        self.get_leaf(input).data().clone()
    }

    /// `depth num_leaves` on one line.
    fn save_ascii(&self, writer: &mut dyn Write) -> io::Result<()> {
        writeln!(writer, "{} {}", self.depth() as f64, self.num_leaves() as f64)
    }
}

/// Forests with every slot empty map everything to 0.
impl<S> Mapping for RegressionForest<S> {
    type Output = f64;

    fn get_output_value(&self, input: &[f64]) -> f64 {
        self.predict(input).unwrap_or(0.0)
    }

    fn save_ascii(&self, writer: &mut dyn Write) -> io::Result<()> {
        self.forest().save_ascii(writer)
    }
}

impl<S> Mapping for RbfForest<S> {
    type Output = f64;

    fn get_output_value(&self, input: &[f64]) -> f64 {
        self.predict(input).unwrap_or(0.0)
    }

    fn save_ascii(&self, writer: &mut dyn Write) -> io::Result<()> {
        self.forest().save_ascii(writer)
    }
}
