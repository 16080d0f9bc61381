//! XML fixtures shaped like Clarity API responses

use clarity_xml::XmlElement;

/// API root every fixture lives under
pub const HOST: &str = "http://lims.test/api/v2/";

pub fn artifact_uri(limsid: &str) -> String {
    format!("{HOST}artifacts/{limsid}")
}

pub fn sample_uri(limsid: &str) -> String {
    format!("{HOST}samples/{limsid}")
}

pub fn container_uri(limsid: &str) -> String {
    format!("{HOST}containers/{limsid}")
}

pub fn project_uri(limsid: &str) -> String {
    format!("{HOST}projects/{limsid}")
}

pub fn process_uri(limsid: &str) -> String {
    format!("{HOST}processes/{limsid}")
}

pub fn step_uri(limsid: &str) -> String {
    format!("{HOST}steps/{limsid}")
}

fn linked(name: &str, uri: &str) -> XmlElement {
    let mut el = XmlElement::new(name).with_attr("uri", uri);
    if let Some(limsid) = uri.split('?').next().and_then(|u| u.rsplit('/').next()) {
        el.set_attr("limsid", limsid);
    }
    el
}

fn udf(name: &str, declared: &str, value: &str) -> XmlElement {
    XmlElement::new("udf:field")
        .with_attr("type", declared)
        .with_attr("name", name)
        .with_text(value)
}

/// Builder for `art:artifact` records
#[derive(Debug, Clone)]
pub struct ArtifactXml {
    limsid: String,
    name: String,
    art_type: String,
    samples: Vec<String>,
    parent_process: Option<String>,
    location: Option<(String, String)>,
    reagent_label: Option<String>,
    udfs: Vec<(String, String, String)>,
    state_suffix: bool,
}

impl ArtifactXml {
    /// Artifact `limsid` of `sample` (sample limsid)
    pub fn new(limsid: &str, name: &str, art_type: &str, sample: &str) -> Self {
        Self {
            limsid: limsid.to_string(),
            name: name.to_string(),
            art_type: art_type.to_string(),
            samples: vec![sample.to_string()],
            parent_process: None,
            location: None,
            reagent_label: None,
            udfs: Vec::new(),
            state_suffix: true,
        }
    }

    pub fn analyte(limsid: &str, sample: &str) -> Self {
        Self::new(limsid, limsid, "Analyte", sample)
    }

    pub fn result_file(limsid: &str, sample: &str) -> Self {
        Self::new(limsid, limsid, "ResultFile", sample)
    }

    pub fn with_sample(mut self, sample: &str) -> Self {
        self.samples.push(sample.to_string());
        self
    }

    /// Drop every sample back-link, as per-input result files do
    pub fn without_sample(mut self) -> Self {
        self.samples.clear();
        self
    }

    /// Produced by process `limsid`
    pub fn from_process(mut self, limsid: &str) -> Self {
        self.parent_process = Some(limsid.to_string());
        self
    }

    pub fn in_container(mut self, container: &str, well: &str) -> Self {
        self.location = Some((container.to_string(), well.to_string()));
        self
    }

    pub fn with_reagent_label(mut self, label: &str) -> Self {
        self.reagent_label = Some(label.to_string());
        self
    }

    pub fn with_udf(mut self, name: &str, declared: &str, value: &str) -> Self {
        self.udfs.push((name.to_string(), declared.to_string(), value.to_string()));
        self
    }

    /// Write the uri without the `?state=` suffix the server normally adds
    pub fn without_state(mut self) -> Self {
        self.state_suffix = false;
        self
    }

    pub fn build(&self) -> XmlElement {
        let uri = if self.state_suffix {
            format!("{}?state=1", artifact_uri(&self.limsid))
        } else {
            artifact_uri(&self.limsid)
        };
        let mut record = XmlElement::new("art:artifact")
            .with_attr("xmlns:art", "http://genologics.com/ri/artifact")
            .with_attr("xmlns:udf", "http://genologics.com/ri/userdefined")
            .with_attr("uri", uri)
            .with_attr("limsid", self.limsid.as_str())
            .with_child(XmlElement::new("name").with_text(self.name.as_str()))
            .with_child(XmlElement::new("type").with_text(self.art_type.as_str()))
            .with_child(XmlElement::new("output-type").with_text(self.art_type.as_str()));
        if let Some(process) = &self.parent_process {
            record.push_child(linked("parent-process", &process_uri(process)));
        }
        if let Some((container, well)) = &self.location {
            record.push_child(
                XmlElement::new("location")
                    .with_child(linked("container", &container_uri(container)))
                    .with_child(XmlElement::new("value").with_text(well.as_str())),
            );
        }
        record.push_child(XmlElement::new("working-flag").with_text("true"));
        for sample in &self.samples {
            record.push_child(linked("sample", &sample_uri(sample)));
        }
        if let Some(label) = &self.reagent_label {
            record.push_child(XmlElement::new("reagent-label").with_attr("name", label.as_str()));
        }
        for (name, declared, value) in &self.udfs {
            record.push_child(udf(name, declared, value));
        }
        record
    }
}

/// `smp:sample` record; `project` of `None` makes a control sample
pub fn sample_xml(limsid: &str, name: &str, project: Option<&str>, zeroth: &str) -> XmlElement {
    let mut record = XmlElement::new("smp:sample")
        .with_attr("xmlns:smp", "http://genologics.com/ri/sample")
        .with_attr("uri", sample_uri(limsid))
        .with_attr("limsid", limsid)
        .with_child(XmlElement::new("name").with_text(name))
        .with_child(XmlElement::new("date-received").with_text("2020-03-04"));
    match project {
        Some(project) => record.push_child(linked("project", &project_uri(project))),
        None => record.push_child(
            XmlElement::new("control-type").with_attr("uri", format!("{HOST}controltypes/1")),
        ),
    }
    record.push_child(linked("artifact", &format!("{}?state=1", artifact_uri(zeroth))));
    record
}

pub fn container_xml(limsid: &str, name: &str, type_name: &str) -> XmlElement {
    XmlElement::new("con:container")
        .with_attr("xmlns:con", "http://genologics.com/ri/container")
        .with_attr("uri", container_uri(limsid))
        .with_attr("limsid", limsid)
        .with_child(XmlElement::new("name").with_text(name))
        .with_child(
            XmlElement::new("type")
                .with_attr("uri", format!("{HOST}containertypes/1"))
                .with_attr("name", type_name),
        )
}

pub fn project_xml(limsid: &str, name: &str) -> XmlElement {
    XmlElement::new("prj:project")
        .with_attr("xmlns:prj", "http://genologics.com/ri/project")
        .with_attr("uri", project_uri(limsid))
        .with_attr("limsid", limsid)
        .with_child(XmlElement::new("name").with_text(name))
}

#[derive(Debug, Clone)]
struct Relation {
    input: String,
    output: Option<(String, String, String)>,
}

/// Builder for step-details and process documents
#[derive(Debug, Clone)]
pub struct StepXml {
    limsid: String,
    name: String,
    is_process: bool,
    relations: Vec<Relation>,
    technician: Option<(String, String)>,
    udfs: Vec<(String, String, String)>,
}

impl StepXml {
    /// `stp:details` of step `limsid`, configured as `name`
    pub fn details(limsid: &str, name: &str) -> Self {
        Self {
            limsid: limsid.to_string(),
            name: name.to_string(),
            is_process: false,
            relations: Vec::new(),
            technician: None,
            udfs: Vec::new(),
        }
    }

    /// `prc:process` `limsid` of type `name`
    pub fn process(limsid: &str, name: &str) -> Self {
        Self {
            is_process: true,
            ..Self::details(limsid, name)
        }
    }

    /// Uri this document is served at
    pub fn uri(&self) -> String {
        if self.is_process {
            process_uri(&self.limsid)
        } else {
            format!("{}/details", step_uri(&self.limsid))
        }
    }

    /// `PerInput` relation
    pub fn per_input(self, input: &str, output: &str, output_type: &str) -> Self {
        self.relation(input, output, output_type, "PerInput")
    }

    /// `PerAllInputs` relation
    pub fn shared(self, input: &str, output: &str, output_type: &str) -> Self {
        self.relation(input, output, output_type, "PerAllInputs")
    }

    pub fn relation(
        mut self,
        input: &str,
        output: &str,
        output_type: &str,
        generation: &str,
    ) -> Self {
        self.relations.push(Relation {
            input: input.to_string(),
            output: Some((output.to_string(), output_type.to_string(), generation.to_string())),
        });
        self
    }

    /// Relation with no output
    pub fn input_only(mut self, input: &str) -> Self {
        self.relations.push(Relation {
            input: input.to_string(),
            output: None,
        });
        self
    }

    pub fn with_technician(mut self, first: &str, last: &str) -> Self {
        self.technician = Some((first.to_string(), last.to_string()));
        self
    }

    pub fn with_udf(mut self, name: &str, declared: &str, value: &str) -> Self {
        self.udfs.push((name.to_string(), declared.to_string(), value.to_string()));
        self
    }

    fn map_element(relation: &Relation) -> XmlElement {
        let mut map = XmlElement::new("input-output-map")
            .with_child(linked("input", &format!("{}?state=2", artifact_uri(&relation.input))));
        if let Some((output, output_type, generation)) = &relation.output {
            map.push_child(
                linked("output", &format!("{}?state=3", artifact_uri(output)))
                    .with_attr("output-type", output_type.as_str())
                    .with_attr("output-generation-type", generation.as_str()),
            );
        }
        map
    }

    pub fn build(&self) -> XmlElement {
        let mut doc = if self.is_process {
            XmlElement::new("prc:process")
                .with_attr("xmlns:prc", "http://genologics.com/ri/process")
                .with_attr("uri", self.uri())
                .with_attr("limsid", self.limsid.as_str())
                .with_child(XmlElement::new("type").with_text(self.name.as_str()))
        } else {
            XmlElement::new("stp:details")
                .with_attr("xmlns:stp", "http://genologics.com/ri/step")
                .with_attr("uri", self.uri())
                .with_child(linked("step", &step_uri(&self.limsid)))
                .with_child(
                    XmlElement::new("configuration")
                        .with_attr("uri", format!("{HOST}configuration/protocols/1/steps/1"))
                        .with_text(self.name.as_str()),
                )
        };
        if let Some((first, last)) = &self.technician {
            doc.push_child(
                XmlElement::new("technician")
                    .with_child(XmlElement::new("first-name").with_text(first.as_str()))
                    .with_child(XmlElement::new("last-name").with_text(last.as_str())),
            );
        }
        if self.is_process {
            for relation in &self.relations {
                doc.push_child(Self::map_element(relation));
            }
        } else {
            let maps = self
                .relations
                .iter()
                .fold(XmlElement::new("input-output-maps"), |maps, r| {
                    maps.with_child(Self::map_element(r))
                });
            doc.push_child(maps);
        }
        for (name, declared, value) in &self.udfs {
            doc.push_child(udf(name, declared, value));
        }
        doc
    }
}
