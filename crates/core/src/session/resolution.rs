//! Resolution selection for the shadow shortcut.
//!
//! Fallback chain: linked-display override, explicit custom dimension,
//! the display's current mode, native, default.

use crate::config::{AppResolutionOverride, Dimension, ResolutionSettings};
use crate::host::SystemInfo;

/// Everything launch preparation needs to know about resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionPlan {
	/// Value written to the shortcut's resolution-override attribute.
	pub override_value: String,
	/// Stream mode passed to the runner when automatic resolution is on.
	pub auto_mode: Option<String>,
	/// Connected display the chosen dimension is linked to, if any.
	pub linked_display: Option<String>,
}

pub async fn plan_resolution(
	settings: &ResolutionSettings,
	system: &impl SystemInfo,
) -> ResolutionPlan {
	// A dimension linked to a currently connected display wins over
	// every other strategy.
	let mut linked: Option<(String, String)> = None;
	if settings.use_linked_displays {
		let connected = system.connected_display_ids().await;
		'dimensions: for dimension in &settings.dimensions {
			for display in &dimension.linked_displays {
				if connected.iter().any(|id| id == display) {
					linked = Some((display.clone(), dimension.mode_string()));
					break 'dimensions;
				}
			}
		}
	}

	let custom = if settings.use_custom_dimensions {
		usize::try_from(settings.selected_dimension_index)
			.ok()
			.and_then(|index| settings.dimensions.get(index))
			.map(Dimension::mode_string)
	} else {
		None
	};

	let override_value = if let Some((_, mode)) = &linked {
		mode.clone()
	} else {
		match settings.app_resolution_override {
			AppResolutionOverride::CustomResolution => {
				custom.clone().unwrap_or_else(|| "Default".to_string())
			}
			AppResolutionOverride::DisplayResolution => match system.current_display_mode().await {
				Some(mode) => mode.mode_string(),
				None => "Default".to_string(),
			},
			AppResolutionOverride::Native => "Native".to_string(),
			AppResolutionOverride::Default => "Default".to_string(),
		}
	};

	let auto_mode = if settings.automatic {
		if let Some((_, mode)) = &linked {
			Some(mode.clone())
		} else if custom.is_some() {
			custom
		} else {
			system
				.current_display_mode()
				.await
				.map(|mode| mode.mode_string())
		}
	} else {
		None
	};

	ResolutionPlan {
		override_value,
		auto_mode,
		linked_display: linked.map(|(display, _)| display),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::fakes::FakeSystem;
	use crate::host::DisplayMode;

	fn dimensions() -> Vec<Dimension> {
		vec![
			Dimension {
				width: 1920,
				height: 1080,
				linked_displays: vec![],
			},
			Dimension {
				width: 2560,
				height: 1600,
				linked_displays: vec!["dock-display".into()],
			},
		]
	}

	#[tokio::test]
	async fn linked_display_wins_over_everything() {
		let system = FakeSystem::new();
		system.set_connected_displays(vec!["dock-display".into()]);
		let settings = ResolutionSettings {
			use_linked_displays: true,
			use_custom_dimensions: true,
			selected_dimension_index: 0,
			dimensions: dimensions(),
			app_resolution_override: AppResolutionOverride::Native,
			automatic: true,
		};

		let plan = plan_resolution(&settings, &system).await;
		assert_eq!(plan.override_value, "2560x1600");
		assert_eq!(plan.auto_mode.as_deref(), Some("2560x1600"));
		assert_eq!(plan.linked_display.as_deref(), Some("dock-display"));
	}

	#[tokio::test]
	async fn custom_dimension_applies_when_selected() {
		let system = FakeSystem::new();
		let settings = ResolutionSettings {
			use_custom_dimensions: true,
			selected_dimension_index: 0,
			dimensions: dimensions(),
			app_resolution_override: AppResolutionOverride::CustomResolution,
			..ResolutionSettings::default()
		};

		let plan = plan_resolution(&settings, &system).await;
		assert_eq!(plan.override_value, "1920x1080");
		assert_eq!(plan.auto_mode, None);
	}

	#[tokio::test]
	async fn display_resolution_falls_back_to_default_without_a_mode() {
		let system = FakeSystem::new();
		let settings = ResolutionSettings {
			app_resolution_override: AppResolutionOverride::DisplayResolution,
			..ResolutionSettings::default()
		};
		assert_eq!(plan_resolution(&settings, &system).await.override_value, "Default");

		system.set_display_mode(Some(DisplayMode { width: 1280, height: 800 }));
		assert_eq!(plan_resolution(&settings, &system).await.override_value, "1280x800");
	}

	#[tokio::test]
	async fn automatic_mode_uses_the_current_display() {
		let system = FakeSystem::new();
		system.set_display_mode(Some(DisplayMode { width: 1280, height: 800 }));
		let settings = ResolutionSettings {
			automatic: true,
			..ResolutionSettings::default()
		};

		let plan = plan_resolution(&settings, &system).await;
		assert_eq!(plan.override_value, "Default");
		assert_eq!(plan.auto_mode.as_deref(), Some("1280x800"));
	}

	#[tokio::test]
	async fn invalid_custom_index_is_ignored() {
		let system = FakeSystem::new();
		let settings = ResolutionSettings {
			use_custom_dimensions: true,
			selected_dimension_index: -1,
			dimensions: dimensions(),
			app_resolution_override: AppResolutionOverride::CustomResolution,
			..ResolutionSettings::default()
		};
		assert_eq!(plan_resolution(&settings, &system).await.override_value, "Default");
	}
}
