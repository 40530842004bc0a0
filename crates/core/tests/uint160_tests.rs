use neo_core::{crypto, UInt160};
use proptest::prelude::*;

proptest! {
    #[test]
    fn display_then_parse_roundtrips(bytes in prop::array::uniform20(any::<u8>())) {
        let value = UInt160::from(bytes);
        prop_assert_eq!(UInt160::parse(&value.to_string()).unwrap(), value);
    }

    #[test]
    fn ordering_matches_reversed_bytes(a in prop::array::uniform20(any::<u8>()), b in prop::array::uniform20(any::<u8>())) {
        let mut ra = a;
        let mut rb = b;
        ra.reverse();
        rb.reverse();
        prop_assert_eq!(UInt160::from(a).cmp(&UInt160::from(b)), ra.cmp(&rb));
    }
}

#[test]
fn test_from_script_is_hash160() {
    let script = [0x11u8, 0x40];
    assert_eq!(UInt160::from_script(&script).to_array(), crypto::hash160(&script));
}
