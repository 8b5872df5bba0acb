//! WASM bindings for the balancer.
//!
//! Build: `wasm-pack build --target nodejs`

use std::path::Path;

use serde_wasm_bindgen::to_value;
use wasm_bindgen::prelude::*;

use crate::balancer::{
    self,
    base::{Range, SelectMode},
};

#[wasm_bindgen]
pub struct Balancer {
    balancer: balancer::Balancer,
}

#[wasm_bindgen]
impl Balancer {
    pub fn new() -> Balancer {
        Balancer {
            balancer: balancer::Balancer::new(),
        }
    }

    pub fn sync_document(&mut self, path: &str, content: &str) {
        self.balancer.sync_document(Path::new(path), content);
    }

    pub fn remove_document(&mut self, path: &str) {
        self.balancer.remove_document(Path::new(path));
    }

    pub fn can_balance(&self, path: &str, location: u32, length: u32) -> bool {
        self.balancer.can_balance(
            Path::new(path),
            Range::new(location as usize, length as usize),
        )
    }

    pub fn balance(&self, path: &str, location: u32, length: u32, select: &str) -> JsValue {
        let mode = match select {
            "opposite" => SelectMode::Opposite,
            _ => SelectMode::Both,
        };

        let selection = Range::new(location as usize, length as usize);
        match self.balancer.balance(Path::new(path), selection, mode) {
            Ok(ranges) => to_value(&ranges).unwrap_or_default(),
            Err(_) => JsValue::null(),
        }
    }
}
