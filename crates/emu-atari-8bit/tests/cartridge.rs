//! Cartridge loading and bank switching through the CPU bus.
//!
//! Images are built so every bank is filled with its own index, which
//! makes the visible bank readable straight off the bus.

use emu_atari_8bit::cartridge::encode_cart;
use emu_atari_8bit::rtime::RTime8;
use emu_atari_8bit::{
    AccessKind, AtariBus, CartError, CartType, Cartridge, LoadOutcome, MachineConfig,
    MachineType, Mmu, NullHardware,
};
use emu_core::Bus;

struct Rig {
    mmu: Mmu,
    cart: Cartridge,
    hw: NullHardware,
}

impl Rig {
    fn new(config: &MachineConfig) -> Self {
        let mut mmu = Mmu::new(config).expect("memory map");
        let mut cart = Cartridge::default();
        cart.start(&mut mmu);
        mmu.power_on_portb();
        Self {
            mmu,
            cart,
            hw: NullHardware,
        }
    }

    fn xl() -> Self {
        Self::new(&MachineConfig::new(MachineType::XlXe, vec![0; 0x4000]))
    }

    fn bus(&mut self) -> AtariBus<'_> {
        AtariBus {
            mmu: &mut self.mmu,
            cart: &mut self.cart,
            hardware: &mut self.hw,
            patch: None,
        }
    }

    fn read(&mut self, addr: u16) -> u8 {
        self.bus().read(addr)
    }

    fn write(&mut self, addr: u16, value: u8) {
        self.bus().write(addr, value);
    }

    fn insert(&mut self, kind: CartType, image: &[u8]) -> LoadOutcome {
        self.cart
            .insert_image(&encode_cart(kind, image), &mut self.mmu)
            .expect("CART image")
    }
}

/// `count` banks of `size` bytes, each filled with its index.
fn banked(size: usize, count: usize) -> Vec<u8> {
    (0..count).flat_map(|bank| vec![bank as u8; size]).collect()
}

#[test]
fn raw_8k_maps_left_window_only() {
    let mut rig = Rig::xl();
    let outcome = rig
        .cart
        .insert_image(&[0xFF; 8192], &mut rig.mmu)
        .expect("raw image");
    assert_eq!(outcome, LoadOutcome::Loaded);
    assert_eq!(rig.cart.kind(), CartType::Std8);
    assert!(rig.mmu.cart_a0bf_enabled());
    assert!(!rig.mmu.cart_809f_enabled());
    assert_eq!(rig.mmu.memory().kind(0xA000), AccessKind::Rom);
    assert_eq!(rig.mmu.memory().kind(0x8000), AccessKind::Ram);

    assert_eq!(rig.read(0xA000), 0xFF);
    rig.write(0xA000, 0);
    assert_eq!(rig.read(0xA000), 0xFF);
    assert_eq!(rig.read(0xBFFF), 0xFF);
}

#[test]
fn cart_files_on_disk() {
    let dir = tempfile::tempdir().expect("temp dir");
    let good = dir.path().join("good.car");
    let bad = dir.path().join("bad.car");
    let image: Vec<u8> = (0..0x4000).map(|i| (i >> 4) as u8).collect();
    let file = encode_cart(CartType::Std16, &image);
    std::fs::write(&good, &file).expect("write");
    let mut corrupt = file.clone();
    corrupt[8] ^= 0x80;
    std::fs::write(&bad, &corrupt).expect("write");

    let mut rig = Rig::xl();
    let outcome = rig.cart.insert(&good, &mut rig.mmu).expect("good CART");
    assert_eq!(outcome, LoadOutcome::Loaded);
    assert_eq!(rig.cart.kind(), CartType::Std16);
    assert!(rig.mmu.cart_809f_enabled());
    assert_eq!(rig.read(0x8010), 0x01);
    assert_eq!(rig.read(0xBFF0), 0xFF);

    let outcome = rig.cart.insert(&bad, &mut rig.mmu).expect("corrupt CART");
    assert!(matches!(outcome, LoadOutcome::BadChecksum { .. }));
    assert_eq!(rig.cart.kind(), CartType::Std16);

    let missing = dir.path().join("missing.car");
    let err = rig.cart.insert(&missing, &mut rig.mmu).unwrap_err();
    assert!(matches!(err, CartError::CannotOpen { .. }));
    assert_eq!(rig.cart.kind(), CartType::None);
    assert!(!rig.mmu.cart_a0bf_enabled());
}

#[test]
fn ambiguous_raw_waits_for_a_type() {
    let mut rig = Rig::xl();
    let outcome = rig
        .cart
        .insert_image(&banked(0x2000, 4), &mut rig.mmu)
        .expect("raw image");
    let LoadOutcome::AmbiguousSize { kb, candidates } = outcome else {
        panic!("expected an ambiguous size");
    };
    assert_eq!(kb, 32);
    assert!(candidates.contains(&CartType::Xegs32));
    assert_eq!(rig.cart.kind(), CartType::None);
    assert!(!rig.mmu.cart_a0bf_enabled());

    assert!(matches!(
        rig.cart.set_type(CartType::Std8, &mut rig.mmu),
        Err(CartError::UnknownType(1))
    ));
    rig.cart
        .set_type(CartType::Xegs32, &mut rig.mmu)
        .expect("XEGS 32K");
    assert_eq!(rig.read(0x8000), 0);
    assert_eq!(rig.read(0xA000), 3);
}

#[test]
fn set_type_without_image() {
    let mut rig = Rig::xl();
    assert!(matches!(
        rig.cart.set_type(CartType::Std8, &mut rig.mmu),
        Err(CartError::NoImage)
    ));
}

#[test]
fn xegs_selects_low_bank_by_value() {
    let mut rig = Rig::xl();
    rig.insert(CartType::Xegs64, &banked(0x2000, 8));
    assert_eq!(rig.read(0xA000), 7);
    rig.write(0xD500, 2);
    assert_eq!(rig.read(0x8000), 2);
    rig.write(0xD5FF, 13);
    assert_eq!(rig.read(0x8000), 5);
    assert_eq!(rig.read(0xA000), 7);
}

#[test]
fn switchable_xegs_turns_off_and_back_on() {
    let mut rig = Rig::xl();
    rig.insert(CartType::SwXegs32, &banked(0x2000, 4));
    rig.write(0xD500, 0x80);
    assert!(!rig.mmu.cart_809f_enabled());
    assert!(!rig.mmu.cart_a0bf_enabled());
    rig.write(0xD500, 1);
    assert!(rig.mmu.cart_809f_enabled());
    assert_eq!(rig.read(0x8000), 1);
    assert_eq!(rig.read(0xA000), 3);
}

#[test]
fn megacart_banks_and_disable() {
    let mut rig = Rig::xl();
    rig.insert(CartType::Mega64, &banked(0x4000, 4));
    assert_eq!((rig.read(0x8000), rig.read(0xA000)), (0, 0));
    rig.write(0xD500, 3);
    assert_eq!((rig.read(0x8000), rig.read(0xBFFF)), (3, 3));
    rig.write(0xD500, 0x80);
    assert!(!rig.mmu.cart_809f_enabled());
    assert!(!rig.mmu.cart_a0bf_enabled());
}

#[test]
fn oss_034m_decodes_address() {
    let mut rig = Rig::xl();
    rig.insert(CartType::Oss034M16, &banked(0x1000, 4));
    assert_eq!((rig.read(0xA000), rig.read(0xB000)), (0, 3));
    // Reads switch as well as writes.
    assert_eq!(rig.read(0xD503), 0xFF);
    assert_eq!(rig.read(0xA000), 1);
    rig.write(0xD504, 0);
    assert_eq!(rig.read(0xA000), 2);
    rig.write(0xD508, 0);
    assert!(!rig.mmu.cart_a0bf_enabled());
    rig.write(0xD500, 0);
    assert_eq!((rig.read(0xA000), rig.read(0xB000)), (0, 3));
}

#[test]
fn oss_m091_starts_on_second_bank() {
    let mut rig = Rig::xl();
    rig.insert(CartType::OssM091, &banked(0x1000, 4));
    assert_eq!((rig.read(0xA000), rig.read(0xB000)), (1, 0));
    rig.write(0xD501, 0);
    assert_eq!(rig.read(0xA000), 3);
    rig.write(0xD509, 0);
    assert_eq!(rig.read(0xA000), 2);
}

#[test]
fn williams_nibble_decode() {
    let mut rig = Rig::xl();
    rig.insert(CartType::Williams64, &banked(0x2000, 8));
    rig.write(0xD503, 0);
    assert_eq!(rig.read(0xA000), 3);
    rig.write(0xD508, 0);
    assert!(!rig.mmu.cart_a0bf_enabled());
    rig.write(0xD512, 0);
    assert!(!rig.mmu.cart_a0bf_enabled());
    rig.write(0xD506, 0);
    assert!(rig.mmu.cart_a0bf_enabled());
    assert_eq!(rig.read(0xA000), 6);
}

#[test]
fn sparta_dos_x_inverted_bank() {
    let mut rig = Rig::xl();
    rig.insert(CartType::SpartaDosX64, &banked(0x2000, 8));
    rig.write(0xD5E0, 0);
    assert_eq!(rig.read(0xA000), 7);
    rig.write(0xD5E5, 0);
    assert_eq!(rig.read(0xA000), 2);
    rig.write(0xD5D0, 0);
    assert_eq!(rig.read(0xA000), 2);
    rig.write(0xD5E8, 0);
    assert!(!rig.mmu.cart_a0bf_enabled());
}

#[test]
fn atarimax_128() {
    let mut rig = Rig::xl();
    rig.insert(CartType::Atarimax128, &banked(0x2000, 16));
    rig.write(0xD50F, 0);
    assert_eq!(rig.read(0xA000), 15);
    rig.write(0xD510, 0);
    assert!(!rig.mmu.cart_a0bf_enabled());
    rig.write(0xD520, 0);
    assert!(!rig.mmu.cart_a0bf_enabled());
}

#[test]
fn db32_banks_low_window_by_address() {
    let mut rig = Rig::xl();
    rig.insert(CartType::Db32, &banked(0x2000, 4));
    assert!(rig.mmu.cart_809f_enabled());
    assert_eq!((rig.read(0x8000), rig.read(0xA000)), (0, 3));
    rig.write(0xD502, 0);
    assert_eq!(rig.read(0x8000), 2);
    // Reads switch too, and only A0-A1 count.
    assert_eq!(rig.read(0xD507), 0xFF);
    assert_eq!((rig.read(0x8000), rig.read(0xA000)), (3, 3));
    rig.write(0xD5F4, 0);
    assert_eq!(rig.read(0x8000), 0);
}

#[test]
fn express_and_diamond_decode_their_own_nibble() {
    for (kind, base) in [(CartType::Express64, 0xD570), (CartType::Diamond64, 0xD5D0)] {
        let mut rig = Rig::xl();
        rig.insert(kind, &banked(0x2000, 8));
        assert_eq!(rig.read(0xA000), 0, "{kind}");
        rig.write(base, 0);
        assert_eq!(rig.read(0xA000), 7, "{kind}");
        rig.write(base + 5, 0);
        assert_eq!(rig.read(0xA000), 2, "{kind}");

        rig.write(0xD500, 0);
        rig.write(0xD5E0, 0);
        assert_eq!(rig.read(0xA000), 2, "{kind}");

        rig.write(base + 8, 0);
        assert!(!rig.mmu.cart_a0bf_enabled());
        rig.write(base + 0x0F, 0);
        assert!(!rig.mmu.cart_a0bf_enabled());
        rig.write(base + 7, 0);
        assert!(rig.mmu.cart_a0bf_enabled());
        assert_eq!(rig.read(0xA000), 0, "{kind}");
    }
}

#[test]
fn turbosoft_masks_and_disables() {
    let mut rig = Rig::xl();
    rig.insert(CartType::Turbosoft64, &banked(0x2000, 8));
    assert_eq!(rig.read(0xA000), 0);
    rig.write(0xD50F, 0);
    assert_eq!(rig.read(0xA000), 7);
    rig.read(0xD503);
    assert_eq!(rig.read(0xA000), 3);
    rig.write(0xD510, 0);
    assert!(!rig.mmu.cart_a0bf_enabled());
    rig.write(0xD501, 0);
    assert!(rig.mmu.cart_a0bf_enabled());
    assert_eq!(rig.read(0xA000), 1);

    rig.insert(CartType::Turbosoft128, &banked(0x2000, 16));
    rig.write(0xD50F, 0);
    assert_eq!(rig.read(0xA000), 15);
    rig.write(0xD51F, 0);
    assert!(!rig.mmu.cart_a0bf_enabled());
}

#[test]
fn ultracart_cycles_on_any_access() {
    let mut rig = Rig::xl();
    rig.insert(CartType::Ultracart32, &banked(0x2000, 4));
    assert_eq!(rig.read(0xA000), 0);
    rig.read(0xD500);
    assert_eq!(rig.read(0xA000), 1);
    rig.write(0xD5FF, 0);
    assert_eq!(rig.read(0xA000), 2);
    rig.read(0xD580);
    assert_eq!(rig.read(0xA000), 3);
    rig.write(0xD500, 0);
    assert!(!rig.mmu.cart_a0bf_enabled());
    rig.read(0xD500);
    assert!(rig.mmu.cart_a0bf_enabled());
    assert_eq!(rig.read(0xA000), 0);
}

#[test]
fn adawliah_advances_and_wraps() {
    let mut rig = Rig::xl();
    rig.insert(CartType::Adawliah32, &banked(0x2000, 4));
    assert_eq!(rig.read(0xA000), 0);
    for bank in [1, 2, 3, 0, 1] {
        rig.write(0xD500, 0);
        assert_eq!(rig.read(0xA000), bank);
    }
    assert!(rig.mmu.cart_a0bf_enabled());

    rig.insert(CartType::Adawliah64, &banked(0x2000, 8));
    for _ in 0..7 {
        rig.read(0xD5C0);
    }
    assert_eq!(rig.read(0xA000), 7);
    rig.read(0xD5C0);
    assert_eq!(rig.read(0xA000), 0);
}

#[test]
fn megamax_2048_decodes_address() {
    let mut rig = Rig::xl();
    rig.insert(CartType::MegaMax2048, &banked(0x4000, 128));
    assert_eq!((rig.read(0x8000), rig.read(0xA000)), (0, 0));
    rig.write(0xD57F, 0);
    assert_eq!((rig.read(0x8000), rig.read(0xBFFF)), (127, 127));
    rig.read(0xD505);
    assert_eq!(rig.read(0x8000), 5);
    rig.write(0xD580, 0);
    assert!(!rig.mmu.cart_809f_enabled());
    assert!(!rig.mmu.cart_a0bf_enabled());
    rig.write(0xD502, 0);
    assert!(rig.mmu.cart_809f_enabled());
    assert!(rig.mmu.cart_a0bf_enabled());
    assert_eq!(rig.read(0x8000), 2);
}

#[test]
fn mega_4096_starts_high_and_disables_on_ff() {
    let mut rig = Rig::xl();
    rig.insert(CartType::Mega4096, &banked(0x4000, 256));
    assert_eq!((rig.read(0x8000), rig.read(0xA000)), (254, 254));
    // Bit 7 is an ordinary bank bit here.
    rig.write(0xD500, 0x80);
    assert!(rig.mmu.cart_809f_enabled());
    assert_eq!(rig.read(0x8000), 0x80);
    rig.write(0xD500, 0xFF);
    assert!(!rig.mmu.cart_809f_enabled());
    assert!(!rig.mmu.cart_a0bf_enabled());
    rig.write(0xD500, 0xFE);
    assert!(rig.mmu.cart_a0bf_enabled());
    assert_eq!((rig.read(0x8000), rig.read(0xBFFF)), (254, 254));
}

/// Each 8 KB bank starts with its bank number, low byte first.
fn numbered_banks(count: usize) -> Vec<u8> {
    let mut image = vec![0; count * 0x2000];
    for bank in 0..count {
        image[bank * 0x2000] = bank as u8;
        image[bank * 0x2000 + 1] = (bank >> 8) as u8;
    }
    image
}

#[test]
fn thecart_registers_select_and_enable() {
    let mut rig = Rig::xl();
    rig.insert(CartType::TheCart32M, &numbered_banks(4096));
    assert!(rig.mmu.cart_a0bf_enabled());
    assert_eq!(
        [rig.read(0xD5A0), rig.read(0xD5A1), rig.read(0xD5A2)],
        [0, 0, 1]
    );
    assert_eq!(rig.read(0xD5A3), 0xFF);

    rig.write(0xD5A0, 0x05);
    rig.write(0xD5A1, 0xC1);
    assert_eq!(rig.read(0xD5A1), 0xC1);
    assert_eq!((rig.read(0xA000), rig.read(0xA001)), (0x05, 0x01));

    // 32 MB holds 4096 banks; higher bank bits wrap.
    rig.write(0xD5A1, 0x3F);
    rig.write(0xD5A0, 0xFF);
    assert_eq!((rig.read(0xA000), rig.read(0xA001)), (0xFF, 0x0F));

    rig.write(0xD5A2, 0);
    assert!(!rig.mmu.cart_a0bf_enabled());
    rig.write(0xD5A2, 1);
    assert!(rig.mmu.cart_a0bf_enabled());
    assert_eq!((rig.read(0xA000), rig.read(0xA001)), (0xFF, 0x0F));
}

#[test]
fn atrax_image_is_descrambled_on_insert() {
    let mut encoded = vec![0u8; 0x20000];
    // Decoded A0 comes from encoded A12, decoded A5 from encoded A0.
    encoded[0x1000] = 0x01;
    encoded[0x0001] = 0x80;
    encoded[3 * 0x2000..4 * 0x2000].fill(0xFF);

    let mut rig = Rig::xl();
    rig.insert(CartType::Atrax128, &encoded);
    // Data bit 0 moves to bit 5, bit 7 to bit 0.
    assert_eq!(rig.read(0xA001), 0x20);
    assert_eq!(rig.read(0xA020), 0x01);
    assert_eq!(rig.read(0xA000), 0x00);

    rig.write(0xD500, 3);
    assert_eq!((rig.read(0xA000), rig.read(0xBFFF)), (0xFF, 0xFF));
    rig.write(0xD500, 0x1F);
    assert_eq!(rig.read(0xA000), 0x00);
    rig.write(0xD500, 0x80);
    assert!(!rig.mmu.cart_a0bf_enabled());
    rig.write(0xD500, 0x13);
    assert!(rig.mmu.cart_a0bf_enabled());
    assert_eq!(rig.read(0xA000), 0xFF);
}

#[test]
fn write_triggered_disables() {
    let mut rig = Rig::xl();
    rig.insert(CartType::Phoenix8, &[0x42; 0x2000]);
    rig.read(0xD500);
    assert!(rig.mmu.cart_a0bf_enabled());
    rig.write(0xD500, 0);
    assert!(!rig.mmu.cart_a0bf_enabled());

    rig.insert(CartType::Blizzard32, &banked(0x2000, 4));
    for bank in 1..4 {
        rig.write(0xD500, 0);
        assert_eq!(rig.read(0xA000), bank);
    }
    rig.write(0xD500, 0);
    assert!(!rig.mmu.cart_a0bf_enabled());
}

#[test]
fn sic_register() {
    let mut rig = Rig::xl();
    rig.insert(CartType::Sic128, &banked(0x4000, 8));
    assert!(!rig.mmu.cart_809f_enabled());
    assert!(rig.mmu.cart_a0bf_enabled());
    rig.write(0xD500, 0x23);
    assert_eq!(rig.read(0xD51F), 0x23);
    assert_eq!((rig.read(0x8000), rig.read(0xA000)), (3, 3));
    rig.write(0xD500, 0x43);
    assert!(!rig.mmu.cart_809f_enabled());
    assert!(!rig.mmu.cart_a0bf_enabled());
}

#[test]
fn ast_pages_through_control_area() {
    let mut rig = Rig::xl();
    let image: Vec<u8> = (0..0x8000).map(|i| (i >> 8) as u8).collect();
    rig.insert(CartType::Ast32, &image);
    assert!(!rig.mmu.cart_a0bf_enabled());
    assert_eq!(rig.read(0xD510), 0);
    rig.write(0xD500, 0);
    rig.write(0xD500, 0);
    assert_eq!(rig.read(0xD5FF), 2);
}

#[test]
fn right_slot_on_400_800_keeps_basic_left() {
    let basic = vec![0xBA; 0x2000];
    let config = MachineConfig::new(MachineType::OsB, vec![0; 0x2800]).with_basic(basic);
    let mut rig = Rig::new(&config);
    assert!(rig.mmu.cart_a0bf_enabled());
    rig.insert(CartType::Right8, &[0x88; 0x2000]);
    assert!(rig.mmu.cart_809f_enabled());
    assert_eq!(rig.read(0x8000), 0x88);
    assert_eq!(rig.read(0xA000), 0xBA);
}

#[test]
fn bounty_bob_hotspots() {
    let mut rig = Rig::xl();
    rig.insert(CartType::BountyBob40, &banked(0x1000, 10));
    assert_eq!(rig.mmu.memory().kind(0x8FF6), AccessKind::Hardware);
    assert_eq!((rig.read(0x8000), rig.read(0x9000), rig.read(0xA000)), (0, 4, 8));
    assert_eq!(rig.read(0x8FF7), 0);
    assert_eq!(rig.read(0x8000), 1);
    rig.write(0x9FF9, 0);
    assert_eq!(rig.read(0x9000), 7);

    rig.cart.remove(&mut rig.mmu);
    assert_eq!(rig.mmu.memory().kind(0x8FF6), AccessKind::Ram);
}

#[test]
fn super_cart_on_5200() {
    let config = MachineConfig::new(MachineType::A5200, vec![0; 0x800]);
    let mut rig = Rig::new(&config);
    assert_eq!(rig.read(0x4000), 0);
    rig.insert(CartType::A5200Super64, &banked(0x8000, 2));
    assert_eq!(rig.read(0x4000), 1);
    assert_eq!(rig.read(0xBFC0), 0);
    assert_eq!(rig.read(0x4000), 0);
    rig.write(0xBFF0, 0);
    assert_eq!(rig.read(0x4000), 1);
}

#[test]
fn five_two_hundred_two_chip_layout() {
    let config = MachineConfig::new(MachineType::A5200, vec![0; 0x800]);
    let mut rig = Rig::new(&config);
    rig.insert(CartType::A5200TwoChip16, &banked(0x2000, 2));
    assert_eq!(rig.read(0x4000), 0);
    assert_eq!(rig.read(0x6000), 0);
    assert_eq!(rig.read(0x8000), 1);
    assert_eq!(rig.read(0xA000), 1);
}

#[test]
fn rtime_scratch_register() {
    let mut rig = Rig::xl();
    let mut cart = Cartridge::new(Some(RTime8::default()));
    cart.start(&mut rig.mmu);
    rig.cart = cart;
    rig.write(0xD5B8, 9);
    rig.write(0xD5B8, 0x0A);
    rig.write(0xD5B9, 0x05);
    rig.write(0xD5B8, 9);
    assert_eq!(rig.read(0xD5B8), 0x0A);
    assert_eq!(rig.read(0xD5B9), 0x05);
}

#[test]
fn remove_frees_both_windows() {
    let mut rig = Rig::xl();
    rig.insert(CartType::Std16, &[0x16; 0x4000]);
    rig.cart.remove(&mut rig.mmu);
    assert_eq!(rig.cart.kind(), CartType::None);
    assert!(!rig.mmu.cart_809f_enabled());
    assert!(!rig.mmu.cart_a0bf_enabled());
    rig.write(0xA000, 0x12);
    assert_eq!(rig.read(0xA000), 0x12);
}
