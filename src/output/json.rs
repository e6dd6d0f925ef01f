use anyhow::Result;
use serde::Serialize;

pub fn render_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::DvaTier;

    #[test]
    fn tiers_serialize_as_screaming_codes() {
        let json = render_json(&[DvaTier::HighlyFlippable, DvaTier::StretchTarget]).unwrap();
        assert!(json.contains("\"HIGHLY_FLIPPABLE\""));
        assert!(json.contains("\"STRETCH_TARGET\""));
    }
}
