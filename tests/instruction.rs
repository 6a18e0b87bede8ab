mod tests {
    use arena_handler::{Color, Instruction};

    #[test]
    fn test_block_descriptor() {
        let instruction = Instruction::block(5, 8, 30, Color::Red);
        assert_eq!(instruction.block, "5,8,255,0,0");
        assert_eq!(instruction.brightness, 30);
        assert!(instruction.led.is_empty());
        assert_eq!(instruction.address(), Some(5));
    }

    #[test]
    fn test_leds_only() {
        let instruction = Instruction::leds_only(2, 8, 10)
            .with_led(0, Color::Blue)
            .with_led(7, Color::White);
        assert_eq!(instruction.block, "2,8,-1,-1,-1");
        assert_eq!(instruction.led, vec!["0,0,0,255", "7,255,255,255"]);
    }

    #[test]
    fn test_wire_layout() {
        let instruction = Instruction::block(0, 2, 25, Color::Blue).with_led(1, Color::Red);
        let expected = "{\n    \"block\": \"0,2,0,0,255\",\n    \"brightness\": 25,\n    \"led\": [\n        \"1,255,0,0\"\n    ]\n}";
        assert_eq!(instruction.to_wire(), expected);
    }

    #[test]
    fn test_wire_empty_leds() {
        let wire = Instruction::block(3, 4, 0, Color::Black).to_wire();
        assert_eq!(
            wire,
            "{\n    \"block\": \"3,4,0,0,0\",\n    \"brightness\": 0,\n    \"led\": []\n}"
        );
    }
}
