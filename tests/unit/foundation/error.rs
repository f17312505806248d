use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        AccordionError::invalid_parameter("x")
            .to_string()
            .contains("invalid parameter:")
    );
    assert!(
        AccordionError::degenerate("x")
            .to_string()
            .contains("degenerate geometry:")
    );
    assert!(
        AccordionError::rasterization("x")
            .to_string()
            .contains("rasterization failure:")
    );
    assert!(
        AccordionError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = AccordionError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}

#[test]
fn report_copy_keeps_variant_and_message() {
    let err = AccordionError::rasterization("surface gone");
    let copy = err.to_report();
    assert!(matches!(copy, AccordionError::Rasterization(ref m) if m == "surface gone"));

    let other = AccordionError::Other(anyhow::anyhow!("deep"));
    assert!(other.to_report().to_string().contains("deep"));
}
