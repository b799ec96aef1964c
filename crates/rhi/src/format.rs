//! Format capability selection.
//!
//! Picks the first format out of an ordered candidate list that supports a
//! required set of format features for a given tiling. Used for the depth
//! attachment format and to check blit support before mipmap generation.

use ash::vk;
use tracing::debug;

use crate::error::RhiError;

/// Selects the first candidate format supporting `features` under `tiling`.
///
/// The candidate order expresses preference; the scan stops at the first
/// match.
///
/// # Errors
///
/// Returns [`RhiError::NoSupportedFormat`] when no candidate qualifies.
pub fn select_supported(
    instance: &ash::Instance,
    physical_device: vk::PhysicalDevice,
    candidates: &[vk::Format],
    tiling: vk::ImageTiling,
    features: vk::FormatFeatureFlags,
) -> Result<vk::Format, RhiError> {
    for &candidate in candidates {
        let props =
            unsafe { instance.get_physical_device_format_properties(physical_device, candidate) };

        let supported = match tiling {
            vk::ImageTiling::LINEAR => props.linear_tiling_features.contains(features),
            vk::ImageTiling::OPTIMAL => props.optimal_tiling_features.contains(features),
            _ => false,
        };

        if supported {
            debug!("Selected format {:?} for features {:?}", candidate, features);
            return Ok(candidate);
        }
    }

    Err(RhiError::NoSupportedFormat {
        candidates: candidates.to_vec(),
        features,
    })
}

/// Selects a depth attachment format.
///
/// Prefers `D32_SFLOAT`, then the combined depth-stencil formats.
///
/// # Errors
///
/// Returns an error if the device supports none of the depth formats.
pub fn select_depth_format(
    instance: &ash::Instance,
    physical_device: vk::PhysicalDevice,
) -> Result<vk::Format, RhiError> {
    select_supported(
        instance,
        physical_device,
        &[
            vk::Format::D32_SFLOAT,
            vk::Format::D32_SFLOAT_S8_UINT,
            vk::Format::D24_UNORM_S8_UINT,
        ],
        vk::ImageTiling::OPTIMAL,
        vk::FormatFeatureFlags::DEPTH_STENCIL_ATTACHMENT,
    )
}

/// Checks whether a format supports linear-filtered sampling under optimal
/// tiling, which the per-level mipmap blit requires.
pub fn supports_linear_blit(
    instance: &ash::Instance,
    physical_device: vk::PhysicalDevice,
    format: vk::Format,
) -> bool {
    let props = unsafe { instance.get_physical_device_format_properties(physical_device, format) };
    props
        .optimal_tiling_features
        .contains(vk::FormatFeatureFlags::SAMPLED_IMAGE_FILTER_LINEAR)
}

/// Returns true when a format carries a stencil aspect.
#[inline]
pub fn has_stencil_component(format: vk::Format) -> bool {
    matches!(
        format,
        vk::Format::D32_SFLOAT_S8_UINT | vk::Format::D24_UNORM_S8_UINT
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stencil_component() {
        assert!(has_stencil_component(vk::Format::D32_SFLOAT_S8_UINT));
        assert!(has_stencil_component(vk::Format::D24_UNORM_S8_UINT));
        assert!(!has_stencil_component(vk::Format::D32_SFLOAT));
        assert!(!has_stencil_component(vk::Format::R8G8B8A8_SRGB));
    }
}
