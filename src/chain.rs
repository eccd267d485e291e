use diwire_core::{Error, Result};

/// The keys currently being resolved by one top-level request, outermost first.
#[derive(Debug)]
pub(crate) struct Chain {
    keys: Vec<String>,
    limit: usize,
}

impl Chain {
    pub(crate) const fn new(limit: usize) -> Self {
        Self {
            keys: Vec::new(),
            limit,
        }
    }

    /// Marks `key` as resolving.
    ///
    /// Fails if `key` is already resolving further up the chain, or if the chain is full.
    pub(crate) fn enter(&mut self, key: &str) -> Result<()> {
        if let Some(start) = self.keys.iter().position(|k| k == key) {
            let mut chain = self.keys[start..].to_vec();
            chain.push(key.to_owned());
            return Err(Error::Cycle { chain });
        }
        if self.keys.len() >= self.limit {
            return Err(Error::DepthExceeded {
                key: key.to_owned(),
                limit: self.limit,
            });
        }
        self.keys.push(key.to_owned());
        Ok(())
    }

    /// Marks the innermost key as resolved.
    pub(crate) fn leave(&mut self) {
        self.keys.pop();
    }

    pub(crate) fn depth(&self) -> usize {
        self.keys.len()
    }
}
