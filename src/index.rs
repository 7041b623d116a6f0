use crate::error::AroError;
use crate::network::Network;
use std::collections::HashMap;

/// Block of the decision vector owned by one element
#[derive(Debug, Clone, PartialEq)]
pub struct ElementBlock {
    pub name: String,
    pub min_idx: usize,
    pub max_idx: usize,
    /// Number of discrete states, 1 for continuous elements
    pub width: usize,
}

/// Layout of the flat decision vector.
///
/// Elements are sorted by name; each element owns `width * num_steps`
/// contiguous positions, with one block of `width` positions per step.
#[derive(Debug, Clone)]
pub struct DecisionIndex {
    num_steps: usize,
    blocks: Vec<ElementBlock>,
    by_name: HashMap<String, usize>,
    len: usize,
}

impl DecisionIndex {
    pub fn new(network: &Network) -> Self {
        let mut elements: Vec<(&str, usize)> = network
            .elements
            .iter()
            .map(|e| (e.name.as_str(), e.width()))
            .collect();
        elements.sort_by(|a, b| a.0.cmp(b.0));

        let num_steps = network.num_steps;
        let mut blocks = Vec::with_capacity(elements.len());
        let mut by_name = HashMap::with_capacity(elements.len());
        let mut offset = 0;
        for (position, (name, width)) in elements.into_iter().enumerate() {
            let size = width * num_steps;
            blocks.push(ElementBlock {
                name: name.to_string(),
                min_idx: offset,
                max_idx: offset + size,
                width,
            });
            by_name.insert(name.to_string(), position);
            offset += size;
        }

        Self {
            num_steps,
            blocks,
            by_name,
            len: offset,
        }
    }

    /// Total length of the decision vector
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn num_steps(&self) -> usize {
        self.num_steps
    }

    /// Blocks in decision vector order
    pub fn blocks(&self) -> &[ElementBlock] {
        &self.blocks
    }

    pub fn block(&self, name: &str) -> Result<&ElementBlock, AroError> {
        self.by_name
            .get(name)
            .map(|position| &self.blocks[*position])
            .ok_or_else(|| AroError::UnknownElement(name.to_string()))
    }

    /// `[min, max)` range of the element over the whole horizon
    pub fn get_x_idx(&self, name: &str) -> Result<(usize, usize), AroError> {
        let block = self.block(name)?;
        Ok((block.min_idx, block.max_idx))
    }
}
