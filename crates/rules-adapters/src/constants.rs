//! A `ConstantsProvider` backed by a fixed, in-process table. Good enough for
//! a CLI run or a test; a service deployment would swap this for one backed
//! by a config or feature-flag store without touching `rules-eval`.

use rules_common::Value;
use rules_eval::adapters::ConstantsProvider;
use rustc_hash::FxHashMap;

pub struct StaticConstantsProvider {
    table: FxHashMap<String, Value>,
}

impl StaticConstantsProvider {
    pub fn new(table: FxHashMap<String, Value>) -> Self {
        StaticConstantsProvider { table }
    }

    pub fn empty() -> Self {
        StaticConstantsProvider { table: FxHashMap::default() }
    }
}

impl ConstantsProvider for StaticConstantsProvider {
    fn resolve(&self, codes: &[String]) -> FxHashMap<String, Value> {
        codes
            .iter()
            .filter_map(|code| self.table.get(code).map(|v| (code.clone(), v.clone())))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_only_requested_codes_present_in_the_table() {
        let mut table = FxHashMap::default();
        table.insert("MIN_SCORE".to_string(), Value::Number(650.into()));
        table.insert("MAX_SCORE".to_string(), Value::Number(850.into()));
        let provider = StaticConstantsProvider::new(table);

        let resolved = provider.resolve(&["MIN_SCORE".to_string(), "UNKNOWN".to_string()]);
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved.get("MIN_SCORE"), Some(&Value::Number(650.into())));
    }
}
