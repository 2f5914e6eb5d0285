//! CLI command implementations.

pub(crate) mod build;
pub(crate) mod render;

pub(crate) use build::BuildArgs;
pub(crate) use render::RenderArgs;

use polyglot_config::Config;
use polyglot_site::{SiteBuilder, SiteLayout, SiteNames, SiteSettings};
use polyglot_template::Directives;

/// Create a site builder from loaded configuration.
pub(crate) fn site_builder(config: &Config) -> SiteBuilder {
    let site = &config.site_resolved;
    let layout = SiteLayout {
        source_dir: site.source_dir.clone(),
        template_dir: site.template_dir.clone(),
        resource_dir: site.resource_dir.clone(),
        output_dir: site.output_dir.clone(),
    };
    let settings = SiteSettings {
        languages: site.languages.clone(),
        names: SiteNames::from(config.names.clone()),
        scope_attribute: config.directives.language_attribute.clone(),
    };
    let directives = Directives {
        invocation: config.directives.invocation.clone(),
        body_slot: config.directives.body_slot.clone(),
        variable_slot: config.directives.variable_slot.clone(),
        location_attribute: config.directives.location_attribute.clone(),
        name_attribute: config.directives.name_attribute.clone(),
    };

    SiteBuilder::new(layout, settings).with_directives(directives)
}
