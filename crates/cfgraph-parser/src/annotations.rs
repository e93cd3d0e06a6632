//! Well-known annotation and capability type names the parser interprets.

pub const CONFIGURATION: &str = "org.springframework.context.annotation.Configuration";
pub const COMPONENT: &str = "org.springframework.stereotype.Component";
pub const SERVICE: &str = "org.springframework.stereotype.Service";
pub const REPOSITORY: &str = "org.springframework.stereotype.Repository";
pub const CONTROLLER: &str = "org.springframework.stereotype.Controller";
pub const COMPONENT_SCAN: &str = "org.springframework.context.annotation.ComponentScan";
pub const COMPONENT_SCANS: &str = "org.springframework.context.annotation.ComponentScans";
pub const IMPORT: &str = "org.springframework.context.annotation.Import";
pub const IMPORT_RESOURCE: &str = "org.springframework.context.annotation.ImportResource";
pub const BEAN: &str = "org.springframework.context.annotation.Bean";
pub const PROPERTY_SOURCE: &str = "org.springframework.context.annotation.PropertySource";
pub const PROPERTY_SOURCES: &str = "org.springframework.context.annotation.PropertySources";
pub const PROFILE: &str = "org.springframework.context.annotation.Profile";
pub const CONDITIONAL: &str = "org.springframework.context.annotation.Conditional";
pub const ORDER: &str = "org.springframework.core.annotation.Order";

pub const IMPORT_SELECTOR: &str = "org.springframework.context.annotation.ImportSelector";
pub const DEFERRED_IMPORT_SELECTOR: &str =
    "org.springframework.context.annotation.DeferredImportSelector";
pub const IMPORT_BEAN_DEFINITION_REGISTRAR: &str =
    "org.springframework.context.annotation.ImportBeanDefinitionRegistrar";
pub const PROPERTY_SOURCE_FACTORY: &str = "org.springframework.core.io.support.PropertySourceFactory";
pub const BEAN_DEFINITION_READER: &str =
    "org.springframework.beans.factory.support.BeanDefinitionReader";

pub const OBJECT: &str = "java.lang.Object";

/// `Ordered.LOWEST_PRECEDENCE`: the ordering key of anything without an explicit order.
pub const LOWEST_PRECEDENCE: i32 = i32::MAX;

/// Annotations whose presence makes a class a (lite) configuration candidate.
pub const CANDIDATE_INDICATORS: [&str; 4] = [COMPONENT, COMPONENT_SCAN, IMPORT, IMPORT_RESOURCE];
