use super::core::decode_screenshot;
use super::dom::quad_bounds;

#[test]
fn test_quad_bounds() {
    let quad = [10.0, 20.0, 110.0, 20.0, 110.0, 70.0, 10.0, 70.0];
    assert_eq!(quad_bounds(&quad), Some((10.0, 20.0, 100.0, 50.0)));
}

#[test]
fn test_quad_bounds_of_transformed_box() {
    // Rotated square: bounds cover the extreme corners.
    let quad = [50.0, 0.0, 100.0, 50.0, 50.0, 100.0, 0.0, 50.0];
    assert_eq!(quad_bounds(&quad), Some((0.0, 0.0, 100.0, 100.0)));
}

#[test]
fn test_quad_bounds_rejects_short_quad() {
    assert_eq!(quad_bounds(&[1.0, 2.0]), None);
}

#[test]
fn test_decode_screenshot() {
    assert_eq!(decode_screenshot("iVBORw==").unwrap(), vec![0x89, b'P', b'N', b'G']);
    assert!(decode_screenshot("not base64!").is_err());
}
