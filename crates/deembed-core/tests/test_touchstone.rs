//! Touchstone I/O Tests
//!
//! Two-port files read through `Touchstone` and `Network`.

use approx::assert_relative_eq;
use num_complex::Complex64;
use std::fs;

use deembed_core::math::transforms::ReferenceImpedance;
use deembed_core::touchstone::{SParamFormat, Touchstone, TouchstoneError};
use deembed_core::Network;

const SIMPLE_TOUCHSTONE: &str = "\
! Created by network analyzer export
! two points, real/imaginary
# GHz S RI R 50.0
1.0 1.0 2.0 3.0 4.0 5.0 6.0 7.0 8.0
1.1 9.0 10.0 11.0 12.0 13.0 14.0 15.0 16.0
";

/// Row-major [f][i][j] data of SIMPLE_TOUCHSTONE (file order is 11 21 12 22)
#[allow(clippy::needless_range_loop)]
#[test]
fn test_read_data() {
    let ts = Touchstone::parse_str(SIMPLE_TOUCHSTONE).unwrap();

    let f_true = [1.0e9, 1.1e9];
    let s_true = [
        [
            [Complex64::new(1.0, 2.0), Complex64::new(5.0, 6.0)],
            [Complex64::new(3.0, 4.0), Complex64::new(7.0, 8.0)],
        ],
        [
            [Complex64::new(9.0, 10.0), Complex64::new(13.0, 14.0)],
            [Complex64::new(11.0, 12.0), Complex64::new(15.0, 16.0)],
        ],
    ];

    assert_eq!(ts.nfreq(), 2);
    let f = ts.frequency.f();
    assert_relative_eq!(f[0], f_true[0], epsilon = 1e3);
    assert_relative_eq!(f[1], f_true[1], epsilon = 1e3);

    for k in 0..2 {
        for i in 0..2 {
            for j in 0..2 {
                let expected = s_true[k][i][j];
                let actual = ts.s[[k, i, j]];
                assert_relative_eq!(actual.re, expected.re, epsilon = 1e-10);
                assert_relative_eq!(actual.im, expected.im, epsilon = 1e-10);
            }
        }
    }

    assert_eq!(ts.z0.ohms(), [50.0, 50.0]);
}

#[test]
fn test_read_comments() {
    let ts = Touchstone::parse_str(SIMPLE_TOUCHSTONE).unwrap();
    assert_eq!(ts.comments.len(), 2);
    assert_eq!(ts.comments[0], "Created by network analyzer export");
}

/// A shorted two-port: S11 = S22 = -1, no transmission
#[test]
fn test_read_short() {
    let content = "# MHz S MA R 50\n\
                   10 1.0 180 0 0 0 0 1.0 180\n\
                   20 1.0 180 0 0 0 0 1.0 180\n";
    let ntwk = Network::from_touchstone_str(content).unwrap();

    for k in 0..ntwk.nfreq() {
        assert_relative_eq!(ntwk.s[[k, 0, 0]].re, -1.0, epsilon = 1e-12);
        assert_relative_eq!(ntwk.s[[k, 0, 0]].im, 0.0, epsilon = 1e-12);
        assert_relative_eq!(ntwk.s[[k, 1, 0]].norm(), 0.0, epsilon = 1e-12);
        assert_relative_eq!(ntwk.s[[k, 1, 1]].re, -1.0, epsilon = 1e-12);
    }
}

/// Z-parameter files are converted on read; converting back restores the file values
#[test]
fn test_network_parameter_conversions() {
    // Normalised Z of a tee: 10 ohm arms, 50 kohm shunt
    let content = "# Hz Z RI R 50\n\
                   1e9 1000.2 0 1000 0 1000 0 1000.2 0\n";
    let ntwk = Network::from_touchstone_str(content).unwrap();
    let z = ntwk.z();

    assert_relative_eq!(z[[0, 0, 0]].re, 50010.0, max_relative = 1e-8);
    assert_relative_eq!(z[[0, 1, 0]].re, 50000.0, max_relative = 1e-8);
    assert_relative_eq!(z[[0, 1, 1]].im, 0.0, epsilon = 1e-3);
}

#[test]
fn test_touchstone_v2_rejected() {
    let content = "[Version] 2.0\n# GHz S RI R 50\n1 0 0 1 0 1 0 0 0\n";
    match Touchstone::parse_str(content) {
        Err(TouchstoneError::Parse { line, .. }) => assert_eq!(line, 1),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn test_write_and_reread_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("thru_1.s2p");

    let ntwk = Network::from_touchstone_str(SIMPLE_TOUCHSTONE)
        .unwrap()
        .with_name("thru_1");
    ntwk.write_touchstone(&path, SParamFormat::MA).unwrap();

    let text = fs::read_to_string(&path).unwrap();
    assert!(text.contains("# HZ S MA R 50"));

    let back = Network::from_touchstone(&path).unwrap();
    assert_eq!(back.name.as_deref(), Some("thru_1"));
    assert_eq!(back.z0, ReferenceImpedance::default());
    for (a, b) in back.s.iter().zip(ntwk.s.iter()) {
        assert_relative_eq!(a.re, b.re, epsilon = 1e-6);
        assert_relative_eq!(a.im, b.im, epsilon = 1e-6);
    }
}

#[test]
fn test_wrong_extension_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("thru.s3p");
    fs::write(&path, SIMPLE_TOUCHSTONE).unwrap();
    assert!(matches!(
        Touchstone::from_file(&path),
        Err(TouchstoneError::InvalidExtension)
    ));
}
