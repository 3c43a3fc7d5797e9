//! Static component catalog.
//!
//! Every installable component is declared here with a stable key. The list
//! is kept in Rust (not a data file) so typos in keys cause test failures and
//! the resolver's coverage check can iterate it at compile-tested constants.

use crate::types::Category;

/// One selectable unit of gaming software or system tuning.
///
/// Immutable, defined at process start, never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Component {
    /// Unique, stable key used in selections and on the CLI
    pub key: &'static str,
    /// Human-readable name
    pub display_name: &'static str,
    /// One-line description
    pub description: &'static str,
    /// Grouping category
    pub category: Category,
}

/// The full component registry.
pub const COMPONENTS: &[Component] = &[
    // Launchers
    Component { key: "steam", display_name: "Steam", description: "Official Steam client", category: Category::Launcher },
    Component { key: "lutris", display_name: "Lutris", description: "Open gaming platform", category: Category::Launcher },
    Component { key: "heroic", display_name: "Heroic Games Launcher", description: "Epic/GOG launcher", category: Category::Launcher },
    Component { key: "bottles", display_name: "Bottles", description: "Wine prefix manager", category: Category::Launcher },
    Component { key: "protonplus", display_name: "ProtonPlus", description: "Proton version manager", category: Category::Launcher },
    Component { key: "gamehub", display_name: "GameHub", description: "Unified game library", category: Category::Launcher },
    Component { key: "minigalaxy", display_name: "Minigalaxy", description: "Simple GOG client", category: Category::Launcher },
    Component { key: "itch", display_name: "itch.io", description: "itch.io desktop app", category: Category::Launcher },
    Component { key: "retroarch", display_name: "RetroArch", description: "Multi-system emulator frontend", category: Category::Launcher },
    Component { key: "pegasus", display_name: "Pegasus", description: "Customizable game launcher frontend", category: Category::Launcher },
    // Drivers
    Component { key: "nvidia", display_name: "NVIDIA Proprietary", description: "Official NVIDIA drivers", category: Category::Driver },
    Component { key: "nvidia-open", display_name: "NVIDIA Open", description: "Open-source NVIDIA kernel modules", category: Category::Driver },
    Component { key: "mesa", display_name: "Mesa (AMD/Intel)", description: "Open-source graphics stack", category: Category::Driver },
    Component { key: "vulkan", display_name: "Vulkan Drivers", description: "Vulkan API support", category: Category::Driver },
    Component { key: "lib32", display_name: "32-bit Libraries", description: "Required for most games", category: Category::Driver },
    // Tools
    Component { key: "gamemode", display_name: "GameMode", description: "CPU/GPU optimizations", category: Category::Tool },
    Component { key: "mangohud", display_name: "MangoHud", description: "Performance overlay", category: Category::Tool },
    Component { key: "goverlay", display_name: "GOverlay", description: "MangoHud configuration GUI", category: Category::Tool },
    Component { key: "protonge", display_name: "Proton-GE", description: "Custom Proton builds", category: Category::Tool },
    Component { key: "wine", display_name: "Wine", description: "Windows compatibility layer", category: Category::Tool },
    Component { key: "winetricks", display_name: "Winetricks", description: "Wine helper scripts", category: Category::Tool },
    Component { key: "dxvk", display_name: "DXVK", description: "DirectX to Vulkan translation", category: Category::Tool },
    Component { key: "vkbasalt", display_name: "vkBasalt", description: "Vulkan post-processing", category: Category::Tool },
    Component { key: "corectrl", display_name: "CoreCtrl", description: "GPU control panel", category: Category::Tool },
    Component { key: "steamtinker", display_name: "Steam Tinker Launch", description: "Steam game customization", category: Category::Tool },
    Component { key: "antimicrox", display_name: "AntiMicroX", description: "Gamepad to keyboard/mouse mapping", category: Category::Tool },
    Component { key: "gpu_recorder", display_name: "GPU Screen Recorder", description: "Low-overhead game recording", category: Category::Tool },
    Component { key: "gamescope", display_name: "Gamescope", description: "Micro-compositor for games", category: Category::Tool },
    Component { key: "obs", display_name: "OBS Studio", description: "Streaming and recording", category: Category::Tool },
    Component { key: "discord", display_name: "Discord", description: "Gaming chat client", category: Category::Tool },
    Component { key: "flatseal", display_name: "Flatseal", description: "Flatpak permissions manager", category: Category::Tool },
    // Optimizations
    Component { key: "cpu_governor", display_name: "Performance CPU Governor", description: "Set CPU to performance mode", category: Category::Optimization },
    Component { key: "swappiness", display_name: "Gaming Swappiness", description: "Lower swappiness to 10 for gaming", category: Category::Optimization },
    Component { key: "io_scheduler", display_name: "I/O Scheduler", description: "Optimize disk I/O for gaming", category: Category::Optimization },
];

/// Look up a component by its stable key.
pub fn find(key: &str) -> Option<&'static Component> {
    COMPONENTS.iter().find(|c| c.key == key)
}

/// Iterate components of one category.
pub fn in_category(category: Category) -> impl Iterator<Item = &'static Component> {
    COMPONENTS.iter().filter(move |c| c.category == category)
}

/// Components that install packages (everything except optimizations).
pub fn package_components() -> impl Iterator<Item = &'static Component> {
    COMPONENTS.iter().filter(|c| c.category != Category::Optimization)
}
