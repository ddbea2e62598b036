use super::stf::{StfReader, Units};
use super::{ConsistReader, VehicleReader};
use crate::error::{ConsistError, Result};
use crate::model::{LoadData, LoadPosition, LoadState, MaxVelocity, TrainConfig, Vehicle};

/// Reads the legacy `Train ( TrainCfg ( ... ) )` encoding.
pub struct LegacyConsistReader {
    stf: StfReader,
}

impl LegacyConsistReader {
    pub fn new(stf: StfReader) -> Self {
        Self { stf }
    }

    pub fn from_text(text: impl Into<String>) -> Self {
        Self::new(StfReader::new(text))
    }

    /// Parses the body of `Train ( ... )`, the keyword itself already consumed.
    fn parse_train(&mut self, ctx: &mut TrainConfig) -> Result<()> {
        let stf = &mut self.stf;
        stf.must_match("(")?;
        while let Some(keyword) = stf.next_keyword()? {
            match keyword.as_str() {
                "traincfg" => parse_train_cfg(stf, ctx)?,
                _ => stf.skip_unknown(&keyword)?,
            }
        }
        Ok(())
    }
}

impl ConsistReader for LegacyConsistReader {
    fn parse(&mut self, ctx: &mut TrainConfig) -> Result<()> {
        let mut found_train = false;
        while let Some(keyword) = self.stf.next_file_keyword()? {
            match keyword.as_str() {
                "train" => {
                    // A later Train block replaces an earlier one.
                    *ctx = TrainConfig::default();
                    self.parse_train(ctx)?;
                    found_train = true;
                }
                _ => self.stf.skip_unknown(&keyword)?,
            }
        }

        if found_train {
            Ok(())
        } else {
            Err(ConsistError::MissingTrain)
        }
    }
}

fn parse_train_cfg(stf: &mut StfReader, ctx: &mut TrainConfig) -> Result<()> {
    stf.must_match("(")?;
    // Inline name; a later Name ( ) block overrides it.
    ctx.name = stf.read_string()?;

    while let Some(keyword) = stf.next_keyword()? {
        match keyword.as_str() {
            "name" => ctx.name = stf.read_string_block()?,
            "serial" => ctx.serial = stf.read_int_block()?,
            "maxvelocity" => ctx.max_velocity = Some(read_max_velocity(stf)?),
            "durability" => ctx.durability = stf.read_float_block(Units::None)?,
            "wagon" | "engine" | "ortseot" => {
                let mut vehicle = Vehicle::default();
                LegacyVehicleReader::new(stf).parse(&mut vehicle)?;
                ctx.vehicles.push(vehicle);
            }
            "ortstraincontrolsystemparameters" => {
                ctx.tcs_parameters_file = stf.read_string_block()?
            }
            _ => stf.skip_unknown(&keyword)?,
        }
    }
    Ok(())
}

fn read_max_velocity(stf: &mut StfReader) -> Result<MaxVelocity> {
    stf.must_match("(")?;
    let limit = stf.read_float(Units::Speed)?;
    if stf.peek_item().is_some_and(|item| item.is_close()) {
        stf.must_match(")")?;
        return Ok(MaxVelocity::new(limit));
    }
    let tolerance = stf.read_float(Units::Speed)?;
    stf.must_match(")")?;
    Ok(MaxVelocity::with_tolerance(limit, tolerance))
}

/// Reads one `Wagon`, `Engine` or `ORTSEot` block.
pub struct LegacyVehicleReader<'a> {
    stf: &'a mut StfReader,
}

impl<'a> LegacyVehicleReader<'a> {
    pub fn new(stf: &'a mut StfReader) -> Self {
        Self { stf }
    }

    /// Reads `( name folder )` into the vehicle.
    fn read_asset(&mut self, ctx: &mut Vehicle) -> Result<()> {
        self.stf.must_match("(")?;
        ctx.name = self.stf.read_string()?;
        ctx.folder = self.stf.read_string()?;
        self.stf.must_match(")")
    }

    fn read_load(&mut self, ctx: &mut Vehicle) -> Result<()> {
        let stf = &mut *self.stf;
        stf.must_match("(")?;

        let mut load = LoadData {
            name: stf.read_string()?,
            folder: stf.read_string()?,
            position: LoadPosition::from_name(&stf.read_string()?),
            state: LoadState::default(),
        };

        // The state is optional; the block may close straight after the position.
        let state = stf.next_item().ok_or_else(|| ConsistError::UnexpectedEof {
            expected: ")".to_string(),
        })?;
        let closed = state.is_close();
        if !closed {
            load.state = LoadState::from_name(&state.text);
        }
        ctx.loads.get_or_insert_with(Vec::new).push(load);

        if !closed {
            stf.must_match(")")?;
        }
        Ok(())
    }
}

impl VehicleReader for LegacyVehicleReader<'_> {
    fn parse(&mut self, ctx: &mut Vehicle) -> Result<()> {
        self.stf.must_match("(")?;
        while let Some(keyword) = self.stf.next_keyword()? {
            match keyword.as_str() {
                "uid" => ctx.uid = self.stf.read_int_block()?,
                "flip" => {
                    self.stf.must_match("(")?;
                    self.stf.must_match(")")?;
                    ctx.flip = true;
                }
                "enginedata" => {
                    self.read_asset(ctx)?;
                    ctx.is_engine = true;
                }
                "wagondata" => self.read_asset(ctx)?,
                "eotdata" => {
                    self.read_asset(ctx)?;
                    ctx.is_eot = true;
                }
                "loaddata" => self.read_load(ctx)?,
                _ => self.stf.skip_unknown(&keyword)?,
            }
        }
        Ok(())
    }
}
